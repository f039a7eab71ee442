use std::env;
use std::path::PathBuf;

const HOME_ENV: &str = "JW_HOME";
const DOTENV_FILE: &str = ".env";
const DEFAULT_HOME_SUBDIR: &str = "jisc_wrangler";

/// Where an operator keeps wrangler settings (`JW_ALT_SUFFIX`,
/// `JW_TITLE_LOOKUP`, ...) when running from outside a checkout: the
/// `.env` in `$JW_HOME`, else in `~/jisc_wrangler`.
fn fallback_dotenv_path(jw_home: Option<PathBuf>, home_dir: Option<PathBuf>) -> Option<PathBuf> {
    let base = match jw_home {
        Some(base) => base,
        None => home_dir?.join(DEFAULT_HOME_SUBDIR),
    };
    Some(base.join(DOTENV_FILE))
}

/// Loads `.env` from the working directory, falling back to the wrangler
/// home. Variables already set in the environment win.
pub fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    let fallback = fallback_dotenv_path(
        env::var_os(HOME_ENV).map(PathBuf::from),
        dirs::home_dir(),
    );

    let Some(path) = fallback else {
        return;
    };
    if path.is_file()
        && let Err(err) = dotenvy::from_path(&path)
    {
        eprintln!("warning: ignoring {}: {err}", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::fallback_dotenv_path;
    use std::path::PathBuf;

    #[test]
    fn jw_home_holds_the_env_file() {
        let got = fallback_dotenv_path(
            Some(PathBuf::from("/srv/wrangler")),
            Some(PathBuf::from("/home/alice")),
        );
        assert_eq!(got, Some(PathBuf::from("/srv/wrangler/.env")));
    }

    #[test]
    fn fallback_uses_home_when_jw_home_unset() {
        let got = fallback_dotenv_path(None, Some(PathBuf::from("/home/alice")));
        assert_eq!(got, Some(PathBuf::from("/home/alice/jisc_wrangler/.env")));
        assert_eq!(fallback_dotenv_path(None, None), None);
    }
}
