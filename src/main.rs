use clap::Parser;

use f::chat;
use f::prelude::*;

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config = Config::load(&args.globals.config_file)?;
    let settings = Settings::resolve(&args.globals, &config)?;

    let endpoint = HttpEndpoint::new(
        settings.url.as_str(),
        settings.api_key.as_deref(),
        settings.timeout,
    )?;
    let session = Session::new(endpoint, settings.style, settings.parameters);
    log::info!("endpoint: {} ({:?})", settings.url, session.style());

    let mut conversation = match settings.system {
        Some(system) => Conversation::with_system(system),
        None => Conversation::new(),
    };

    let tty = atty::is(atty::Stream::Stdout);
    let printer = Printer::new(settings.pretty && tty, !settings.quiet && tty);

    match args.command {
        Commands::Chat => chat::run(
            &session,
            &mut conversation,
            std::io::stdin().lock(),
            std::io::stdout(),
            &printer,
        ),
        Commands::Invoke { prompt, format } => chat::invoke(
            &session,
            &mut conversation,
            prompt.into_inner().trim(),
            format,
            std::io::stdout(),
            &printer,
        ),
    }
}
