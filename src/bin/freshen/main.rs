use freshen::util::command_prelude;

mod cli;
mod commands;

fn main() {
    setup_logger();

    let result = cli::main();

    match result {
        Err(e) => freshen::exit_with_error(e),
        Ok(()) => {}
    }
}

fn setup_logger() {
    let env = tracing_subscriber::EnvFilter::from_env("FRESHEN_LOG");

    tracing_subscriber::fmt()
        .with_timer(tracing_subscriber::fmt::time::Uptime::default())
        .with_ansi(std::io::IsTerminal::is_terminal(&std::io::stderr()))
        .with_writer(std::io::stderr)
        .with_env_filter(env)
        .init();
}
