mod alto2txt;
mod cli;
mod commands;
mod config;
mod env_loader;
mod error;
mod logging;
mod wrangler;

fn main() {
    env_loader::load_dotenv();

    if let Err(err) = cli::run() {
        match error::code_of(&err) {
            Some(code) => eprintln!("error[{}]: {err:#}", code.as_str()),
            None => eprintln!("error: {err:#}"),
        }
        std::process::exit(1);
    }
}
