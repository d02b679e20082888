use anyhow::{Context, bail};

pub const USAGE: &str = "usage: tome <file> [--config FILE] <command>

commands:
  stats                          size, line and piece counts
  find PATTERN [flags]           list every match as line:column
  replace PATTERN REPLACEMENT [flags]
                                 replace every match and save

flags:
  --regex        treat PATTERN as a regular expression
  --ignore-case  case-insensitive matching
  --match-case   case-sensitive matching
  --whole-word   only matches with no word character on either side";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Stats,
    Find { pattern: String },
    Replace { pattern: String, replacement: String },
}

/// Search flags given on the command line. Unset flags fall back to the
/// config's search defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchFlags {
    pub regex: bool,
    pub match_case: Option<bool>,
    pub whole_word: bool,
}

impl SearchFlags {
    pub fn apply(
        &self,
        mut query: editor_core::search::SearchQuery,
    ) -> editor_core::search::SearchQuery {
        query.regex |= self.regex;
        query.whole_word |= self.whole_word;

        if let Some(match_case) = self.match_case {
            query.match_case = match_case;
        }

        query
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cli {
    pub path: std::path::PathBuf,
    pub config: Option<std::path::PathBuf>,
    pub command: Command,
    pub flags: SearchFlags,
}

pub fn parse(args: impl IntoIterator<Item = String>) -> anyhow::Result<Cli> {
    let mut args = args.into_iter();
    let mut positionals = Vec::new();
    let mut config = None;
    let mut flags = SearchFlags::default();

    while let Some(arg) = args.next() {
        if let Some(value) = arg.strip_prefix("--config=") {
            config = Some(value.into());

            continue;
        }

        match arg.as_str() {
            "--config" => {
                let value = args.next().context("--config needs a file")?;

                config = Some(value.into());
            }
            "--regex" => flags.regex = true,
            "--ignore-case" => flags.match_case = Some(false),
            "--match-case" => flags.match_case = Some(true),
            "--whole-word" => flags.whole_word = true,
            flag if flag.starts_with("--") => bail!("unknown flag {flag}\n\n{USAGE}"),
            _ => positionals.push(arg),
        }
    }

    let mut positionals = positionals.into_iter();

    let Some(path) = positionals.next() else {
        bail!("missing file\n\n{USAGE}");
    };

    let command = match positionals.next().as_deref() {
        Some("stats") => Command::Stats,
        Some("find") => Command::Find {
            pattern: positionals.next().context("find needs a PATTERN")?,
        },
        Some("replace") => Command::Replace {
            pattern: positionals.next().context("replace needs a PATTERN")?,
            replacement: positionals.next().context("replace needs a REPLACEMENT")?,
        },
        Some(other) => bail!("unknown command {other}\n\n{USAGE}"),
        None => bail!("missing command\n\n{USAGE}"),
    };

    if let Some(extra) = positionals.next() {
        bail!("unexpected argument {extra}\n\n{USAGE}");
    }

    Ok(Cli {
        path: path.into(),
        config,
        command,
        flags,
    })
}

#[cfg(test)]
mod cli_tests {
    use super::{Command, SearchFlags, parse};

    fn args(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn parses_replace_with_flags_anywhere() {
        let line = "--regex notes.txt replace a+ b --config=cfg.json --match-case";
        let cli = parse(args(line)).unwrap();

        assert_eq!(cli.path, std::path::PathBuf::from("notes.txt"));
        assert_eq!(cli.config, Some("cfg.json".into()));
        assert_eq!(
            cli.command,
            Command::Replace {
                pattern: "a+".to_string(),
                replacement: "b".to_string(),
            }
        );
        assert_eq!(
            cli.flags,
            SearchFlags {
                regex: true,
                match_case: Some(true),
                whole_word: false,
            }
        );
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse(args("")).is_err());
        assert!(parse(args("file.txt")).is_err());
        assert!(parse(args("file.txt find")).is_err());
        assert!(parse(args("file.txt frob")).is_err());
        assert!(parse(args("file.txt stats extra")).is_err());
        assert!(parse(args("file.txt stats --verbose")).is_err());
        assert!(parse(args("file.txt stats --config")).is_err());
    }

    #[test]
    fn flags_override_config_defaults() {
        let defaults = editor_core::search::SearchQuery::literal("x").match_case(false);
        let flags = SearchFlags {
            regex: false,
            match_case: Some(true),
            whole_word: true,
        };

        let query = flags.apply(defaults);

        assert!(query.match_case);
        assert!(query.whole_word);
        assert!(!query.regex);
        assert_eq!(SearchFlags::default().apply(query.clone()), query);
    }
}
