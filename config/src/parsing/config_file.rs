//! Parsing logic for a separate sync node config file

use std::fs;

use clap::Parser;
use toml::{Value, map::Map};

use crate::{Cli, SyncNodeConfig, parsing::parse_config_from_args};

/// The CLI argument name for the config file
const CONFIG_FILE_ARG: &str = "--config-file";

/// Parse args from the config file named in the given cli args, if any
pub(crate) fn config_file_args(cli_args: &[String]) -> Result<Vec<String>, String> {
    let Some(index) = cli_args.iter().position(|arg| arg == CONFIG_FILE_ARG) else {
        return Ok(vec![]);
    };

    // The next argument is the file to read from
    let path = cli_args
        .get(index + 1)
        .ok_or_else(|| format!("{CONFIG_FILE_ARG} requires a path"))?;
    read_config_file(path)
}

/// Parse a config entirely from a file
pub fn parse_config_from_file(path: &str) -> Result<SyncNodeConfig, String> {
    let mut file_args = read_config_file(path)?;
    file_args.insert(0, "dummy-program-name".to_string());
    let cli = Cli::try_parse_from(file_args).map_err(|err| err.to_string())?;
    parse_config_from_args(cli)
}

/// Parse a config file into a list of CLI args
fn read_config_file(path: &str) -> Result<Vec<String>, String> {
    let file_contents =
        fs::read_to_string(path).map_err(|err| format!("error reading {path}: {err}"))?;
    let config_kv_pairs: Map<_, _> =
        toml::from_str(&file_contents).map_err(|err| err.to_string())?;

    let mut config_file_args: Vec<String> = Vec::with_capacity(config_kv_pairs.len());
    for (toml_key, value) in config_kv_pairs.iter() {
        // Format the TOML key into --key
        let cli_arg = format!("--{toml_key}");
        config_file_args.extend(parse_toml_value(cli_arg, value)?);
    }

    Ok(config_file_args)
}

// ----------------
// | TOML Parsing |
// ----------------

/// Parse a toml value into a list of strings to append to the CLI args
fn parse_toml_value(cli_arg: String, val: &Value) -> Result<Vec<String>, String> {
    match val {
        // A boolean flag is "--key" when true and absent otherwise
        Value::Boolean(b) => Ok(if *b { vec![cli_arg] } else { vec![] }),
        Value::Array(_) | Value::Table(_) => {
            Err(format!("{cli_arg}: arrays and tables are not supported"))
        },
        x => Ok(vec![cli_arg, toml_value_to_string(x)?]),
    }
}

/// Helper method to convert a toml value to a string
fn toml_value_to_string(val: &Value) -> Result<String, String> {
    Ok(match val {
        Value::String(val) => val.clone(),
        Value::Integer(val) => val.to_string(),
        Value::Float(val) => val.to_string(),
        Value::Boolean(val) => val.to_string(),
        _ => {
            return Err("unsupported value".to_string());
        },
    })
}

#[cfg(test)]
mod test {
    use toml::Value;

    use super::parse_toml_value;

    /// Tests the conversion of toml values into cli args
    #[test]
    fn test_toml_value_to_args() {
        let arg = || "--key".to_string();

        assert_eq!(parse_toml_value(arg(), &Value::Boolean(true)).unwrap(), vec!["--key"]);
        assert!(parse_toml_value(arg(), &Value::Boolean(false)).unwrap().is_empty());
        assert_eq!(parse_toml_value(arg(), &Value::Integer(500)).unwrap(), vec!["--key", "500"]);
        assert_eq!(
            parse_toml_value(arg(), &Value::String("0x7de".to_string())).unwrap(),
            vec!["--key", "0x7de"]
        );
        assert!(parse_toml_value(arg(), &Value::Array(vec![])).is_err());
    }
}
