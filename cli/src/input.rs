//! Batch and initial-variable input for the commands.

use std::path::Path;

use calcflow_core::error::CliError;
use calcflow_core::executor::{Value, VariableTable};
use tokio::io::AsyncReadExt;

use crate::commands::cli::InputArgs;

/// Non-empty lines that are not `#` comments, trimmed.
pub fn parse_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

async fn read_file(path: &Path) -> Result<String, CliError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CliError::Input(format!("failed to read {}: {}", path.display(), e)))
}

async fn read_stdin() -> Result<String, CliError> {
    let mut text = String::new();
    tokio::io::stdin().read_to_string(&mut text).await?;
    Ok(text)
}

/// Collect the batch from arguments, `--file` and `--stdin`, in that order.
pub async fn read_batch(input: &InputArgs) -> Result<Vec<String>, CliError> {
    let mut batch: Vec<String> = input
        .expressions
        .iter()
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .collect();

    if let Some(path) = &input.file {
        batch.extend(parse_lines(&read_file(path).await?));
    }
    if input.stdin {
        batch.extend(parse_lines(&read_stdin().await?));
    }

    if batch.is_empty() {
        return Err(CliError::Input(
            "no expressions given (pass them as arguments, --file or --stdin)".to_string(),
        ));
    }
    tracing::debug!(expressions = batch.len(), "batch read");
    Ok(batch)
}

/// Parse `NAME=VALUE` pairs; later pairs win.
pub fn parse_vars(pairs: &[String]) -> Result<VariableTable, CliError> {
    let mut table = VariableTable::new();
    for pair in pairs {
        let Some((name, value)) = pair.split_once('=') else {
            return Err(CliError::Input(format!("invalid --var '{pair}', expected NAME=VALUE")));
        };
        let name = name.trim();
        let valid_name = name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid_name {
            return Err(CliError::Input(format!("invalid variable name '{name}'")));
        }
        let value = value
            .trim()
            .parse::<Value>()
            .map_err(|e| CliError::Input(format!("invalid value for '{name}': {e}")))?;
        table.insert(name.to_string(), value);
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_parse_lines_skips_blank_and_comments() {
        let text = "# setup\nx = 1\n\n   \n  y = x + 1  \n#z = 3\n";
        assert_eq!(parse_lines(text), vec!["x = 1", "y = x + 1"]);
    }

    #[test]
    fn test_parse_vars() {
        let table = parse_vars(&["x=4".to_string(), " y = -2 ".to_string(), "x=5".to_string()])
            .unwrap();
        assert_eq!(table.get("x"), Some(&5));
        assert_eq!(table.get("y"), Some(&-2));

        assert!(parse_vars(&["x".to_string()]).is_err());
        assert!(parse_vars(&["1x=2".to_string()]).is_err());
        assert!(parse_vars(&["x=abc".to_string()]).is_err());
    }

    #[tokio::test]
    async fn test_read_batch_from_args_and_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# comment\nz = x + y\n").unwrap();

        let input = InputArgs {
            expressions: vec!["x = 1".to_string(), "y = 2".to_string()],
            file: Some(file.path().to_path_buf()),
            ..InputArgs::default()
        };
        let batch = read_batch(&input).await.unwrap();
        assert_eq!(batch, vec!["x = 1", "y = 2", "z = x + y"]);
    }

    #[tokio::test]
    async fn test_empty_batch_is_an_input_error() {
        let err = read_batch(&InputArgs::default()).await.unwrap_err();
        assert!(matches!(err, CliError::Input(_)));
    }

    #[tokio::test]
    async fn test_missing_file_is_an_input_error() {
        let input = InputArgs {
            file: Some("/definitely/not/here.calc".into()),
            ..InputArgs::default()
        };
        let err = read_batch(&input).await.unwrap_err();
        assert!(matches!(err, CliError::Input(_)));
    }
}
