//! Command-line argument parsing.
//!
//! `stmtwrap [--config PATH] [--num-rows] [--] SQL [PARAM ...]`
//!
//! Options go before the SQL text; everything after it is a parameter, so
//! negative numbers pass through untouched.

use std::ffi::OsString;

use clap::Parser;
use stmtwrap_db::{Param, ParamArg};

/// Run one prepared statement and print the result as JSON lines.
///
/// Parameters are bound positionally. Each one parses as an integer, then a
/// float, otherwise text. `null`, `true` and `false` are recognised, and a
/// bracketed comma list such as [1,2,3] binds as a nested sequence.
#[derive(Debug, Parser)]
#[command(name = "stmtwrap", version)]
pub struct Cli {
    /// Configuration file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Print the result row count instead of the rows
    #[arg(long)]
    pub num_rows: bool,

    /// SQL text with `?` placeholders
    pub sql: String,

    /// Positional parameters
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub params: Vec<String>,
}

/// A parsed invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// Explicit `--config` path, if given.
    pub config_path: Option<String>,
    /// Print the result row count instead of the rows.
    pub num_rows: bool,
    /// SQL text with `?` placeholders.
    pub sql: String,
    /// Positional parameters.
    pub params: Vec<ParamArg>,
}

impl From<Cli> for Invocation {
    fn from(cli: Cli) -> Self {
        Self {
            config_path: cli.config,
            num_rows: cli.num_rows,
            sql: cli.sql,
            params: cli.params.iter().map(|raw| parse_param(raw)).collect(),
        }
    }
}

/// Parses a full argument list, program name first.
///
/// # Errors
///
/// Returns a `clap::Error` if an option is unknown or incomplete, or no SQL
/// is given.
pub fn parse_args<I, T>(args: I) -> Result<Invocation, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Cli::try_parse_from(args).map(Invocation::from)
}

/// Parses one parameter argument.
pub fn parse_param(raw: &str) -> ParamArg {
    match raw
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
    {
        Some("") => ParamArg::Many(Vec::new()),
        Some(list) => ParamArg::Many(list.split(',').map(|item| parse_scalar(item.trim())).collect()),
        None => ParamArg::One(parse_scalar(raw)),
    }
}

fn parse_scalar(raw: &str) -> Param {
    match raw {
        "null" => Param::Null,
        "true" => Param::Bool(true),
        "false" => Param::Bool(false),
        _ => {
            if let Ok(i) = raw.parse::<i64>() {
                Param::Integer(i)
            } else if let Ok(f) = raw.parse::<f64>() {
                Param::Float(f)
            } else {
                Param::Text(raw.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::error::ErrorKind;
    use clap::CommandFactory;

    use super::*;

    fn argv(items: &[&str]) -> Vec<String> {
        std::iter::once("stmtwrap")
            .chain(items.iter().copied())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_flags_sql_and_params() {
        let inv = parse_args(argv(&[
            "--config",
            "db.toml",
            "--num-rows",
            "SELECT * FROM t WHERE a = ? AND b = ?",
            "-5",
            "abc",
        ]))
        .expect("should parse");

        assert_eq!(inv.config_path.as_deref(), Some("db.toml"));
        assert!(inv.num_rows);
        assert_eq!(inv.sql, "SELECT * FROM t WHERE a = ? AND b = ?");
        assert_eq!(
            inv.params,
            vec![
                ParamArg::One(Param::Integer(-5)),
                ParamArg::One(Param::Text("abc".to_string())),
            ]
        );
    }

    #[test]
    fn double_dash_ends_flags() {
        let inv = parse_args(argv(&["--", "--not-a-flag"])).expect("should parse");
        assert_eq!(inv.sql, "--not-a-flag");
        assert!(inv.params.is_empty());
    }

    #[test]
    fn rejects_bad_invocations() {
        let kind = |items: &[&str]| {
            parse_args(argv(items))
                .err()
                .map(|err| err.kind())
                .expect("should fail")
        };

        assert_eq!(kind(&[]), ErrorKind::MissingRequiredArgument);
        assert_eq!(kind(&["--num-rows"]), ErrorKind::MissingRequiredArgument);
        assert_eq!(kind(&["--verbose", "SELECT 1"]), ErrorKind::UnknownArgument);
        assert!(parse_args(argv(&["--config"])).is_err());
    }

    #[test]
    fn scalar_inference() {
        assert_eq!(parse_param("42"), ParamArg::One(Param::Integer(42)));
        assert_eq!(parse_param("2.5"), ParamArg::One(Param::Float(2.5)));
        assert_eq!(parse_param("null"), ParamArg::One(Param::Null));
        assert_eq!(parse_param("false"), ParamArg::One(Param::Bool(false)));
        assert_eq!(
            parse_param("hello world"),
            ParamArg::One(Param::Text("hello world".to_string()))
        );
    }

    #[test]
    fn bracketed_list_is_a_nested_sequence() {
        assert_eq!(
            parse_param("[1, x ,2.5]"),
            ParamArg::Many(vec![
                Param::Integer(1),
                Param::Text("x".to_string()),
                Param::Float(2.5),
            ])
        );
        assert_eq!(parse_param("[]"), ParamArg::Many(Vec::new()));
        assert_eq!(
            parse_param("[unterminated"),
            ParamArg::One(Param::Text("[unterminated".to_string()))
        );
    }
}
