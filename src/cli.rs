use battlerite_api::MatchQuery;

const DEFAULT_LIMIT: u32 = 5;
const DEFAULT_SORT: &str = "-createdAt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Matches { full: bool },
    Match { id: String },
    Player { id: String },
    Telemetry { reference: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub command: Command,
    pub limit: u32,
    pub offset: Option<u32>,
    pub sort: String,
    pub players: Vec<String>,
    pub mode: Option<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            command: Command::Matches { full: false },
            limit: DEFAULT_LIMIT,
            offset: None,
            sort: DEFAULT_SORT.into(),
            players: Vec::new(),
            mode: None,
        }
    }
}

impl Options {
    pub fn match_query(&self) -> MatchQuery {
        let mut query = MatchQuery::new().sort(&self.sort).limit(self.limit);
        if let Some(offset) = self.offset {
            query = query.offset(offset);
        }
        if !self.players.is_empty() {
            query = query.player_names(&self.players);
        }
        if let Some(mode) = &self.mode {
            query = query.game_mode(mode);
        }
        query
    }
}

/// Parse the command line. `None` means help or version was printed.
/// Bad arguments print usage and exit with status 2.
pub fn parse_args(args: impl IntoIterator<Item = String>) -> Option<Options> {
    match try_parse(args) {
        Ok(Parsed::Run(options)) => Some(options),
        Ok(Parsed::Help) => {
            println!("{}", usage_text());
            None
        }
        Ok(Parsed::Version) => {
            println!("battlerite {}", env!("CARGO_PKG_VERSION"));
            None
        }
        Err(message) => {
            eprintln!("{message}\n\n{}", usage_text());
            std::process::exit(2);
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Parsed {
    Run(Options),
    Help,
    Version,
}

fn try_parse(args: impl IntoIterator<Item = String>) -> Result<Parsed, String> {
    let mut options = Options::default();
    let mut full = false;
    let mut positional = Vec::new();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Parsed::Help),
            "-V" | "--version" => return Ok(Parsed::Version),
            "--full" => full = true,
            "--limit" => options.limit = number(&arg, args.next())?,
            "--offset" => options.offset = Some(number(&arg, args.next())?),
            "--sort" => options.sort = value(&arg, args.next())?,
            "--player" => options.players.push(value(&arg, args.next())?),
            "--mode" => options.mode = Some(value(&arg, args.next())?),
            flag if flag.starts_with('-') => return Err(format!("Unknown argument: {flag}")),
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    options.command = match (positional.next().as_deref(), positional.next()) {
        (None | Some("matches"), None) => Command::Matches { full },
        (Some("match"), Some(id)) => Command::Match { id },
        (Some("player"), Some(id)) => Command::Player { id },
        (Some("telemetry"), Some(reference)) => Command::Telemetry { reference },
        (Some(cmd @ ("match" | "player" | "telemetry")), None) => {
            return Err(format!("`{cmd}` needs an argument"));
        }
        (Some("matches") | None, Some(extra)) => {
            return Err(format!("Unexpected argument: {extra}"));
        }
        (Some(other), _) => return Err(format!("Unknown command: {other}")),
    };
    if let Some(extra) = positional.next() {
        return Err(format!("Unexpected argument: {extra}"));
    }
    Ok(Parsed::Run(options))
}

fn value(flag: &str, next: Option<String>) -> Result<String, String> {
    next.ok_or_else(|| format!("{flag} needs a value"))
}

fn number(flag: &str, next: Option<String>) -> Result<u32, String> {
    let raw = value(flag, next)?;
    raw.parse()
        .map_err(|_| format!("{flag} expects a number, got `{raw}`"))
}

fn usage_text() -> &'static str {
    "battlerite - Battlerite match data from the Gamelocker API, printed as JSON

Usage:
  battlerite [matches] [--limit N] [--offset N] [--sort FIELD]
             [--player NAME]... [--mode MODE] [--full]
  battlerite match <id>
  battlerite player <id>
  battlerite telemetry <url>
  battlerite --help
  battlerite --version

Options:
  --full     Also download each match's telemetry

Environment:
  BATTLERITE_API_KEY   Gamelocker API key (required; may be set in .env)
  RUST_LOG             Log filter (default warn)"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Parsed, String> {
        try_parse(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn no_arguments_lists_recent_matches() {
        assert_eq!(parse(&[]), Ok(Parsed::Run(Options::default())));
    }

    #[test]
    fn match_flags_build_the_query() {
        let Ok(Parsed::Run(options)) =
            parse(&["--limit", "2", "--player", "Jade", "--player", "Ruh Kaan", "--full"])
        else {
            panic!("expected options");
        };
        assert_eq!(options.command, Command::Matches { full: true });
        assert_eq!(
            options.match_query().to_query_string().unwrap(),
            "?sort=-createdAt&page[limit]=2&filter[playerNames]=Jade%2CRuh%20Kaan"
        );
    }

    #[test]
    fn subcommands_take_an_id() {
        assert!(matches!(
            parse(&["match", "abc"]),
            Ok(Parsed::Run(Options { command: Command::Match { ref id }, .. })) if id == "abc"
        ));
        assert!(matches!(
            parse(&["telemetry", "https://cdn.example/t.json"]),
            Ok(Parsed::Run(Options { command: Command::Telemetry { .. }, .. }))
        ));
        assert!(parse(&["player"]).is_err());
    }

    #[test]
    fn bad_arguments_are_reported() {
        assert!(parse(&["--limit", "many"]).is_err());
        assert!(parse(&["--bogus"]).is_err());
        assert!(parse(&["matches", "extra"]).is_err());
        assert_eq!(parse(&["--help"]), Ok(Parsed::Help));
    }
}
