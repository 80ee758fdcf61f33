use crate::error::{EmuError, Result};

/// 制御コマンド
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `bw <bytes/s>`
    SetRate(u64),
    /// `trace <path>`
    StartTrace(String),
    /// `quit`
    Quit,
    /// 認識できない入力
    Help,
}

impl Command {
    /// 1行分の入力を解析
    ///
    /// 未知のコマンドは `Command::Help` になり、エラーにはなりません。
    /// 引数が欠けている・不正な場合は `EmuError::Usage` を返します。
    pub fn parse(line: &str) -> Result<Command> {
        let mut tokens = line.split_whitespace();

        match tokens.next() {
            Some("quit") => Ok(Command::Quit),
            Some("bw") => {
                let arg = tokens
                    .next()
                    .ok_or_else(|| EmuError::Usage("bw <bytes/s>".to_string()))?;
                Ok(Command::SetRate(parse_rate(arg)?))
            }
            Some("trace") => {
                let path = tokens
                    .next()
                    .ok_or_else(|| EmuError::Usage("trace <path>".to_string()))?;
                Ok(Command::StartTrace(path.to_string()))
            }
            _ => Ok(Command::Help),
        }
    }
}

/// 帯域値（非負整数、バイト/秒）を解析
pub fn parse_rate(arg: &str) -> Result<u64> {
    if arg.is_empty() || !arg.bytes().all(|b| b.is_ascii_digit()) {
        return Err(EmuError::Usage(format!(
            "bandwidth must be a non-negative integer in bytes/s, got '{}'",
            arg
        )));
    }
    arg.parse::<u64>()
        .map_err(|_| EmuError::Usage(format!("bandwidth '{}' is out of range", arg)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() -> Result<()> {
        assert_eq!(Command::parse("bw 5000")?, Command::SetRate(5000));
        assert_eq!(Command::parse("  bw   0  ")?, Command::SetRate(0));
        assert_eq!(Command::parse("trace traces/lte.txt")?, Command::StartTrace("traces/lte.txt".to_string()));
        assert_eq!(Command::parse("quit")?, Command::Quit);
        Ok(())
    }

    #[test]
    fn test_unknown_input_is_help() -> Result<()> {
        assert_eq!(Command::parse("foo bar")?, Command::Help);
        assert_eq!(Command::parse("")?, Command::Help);
        assert_eq!(Command::parse("BW 10")?, Command::Help);
        Ok(())
    }

    #[test]
    fn test_bad_arguments_are_usage_errors() {
        assert!(matches!(Command::parse("bw"), Err(EmuError::Usage(_))));
        assert!(matches!(Command::parse("bw abc"), Err(EmuError::Usage(_))));
        assert!(matches!(Command::parse("bw -5"), Err(EmuError::Usage(_))));
        assert!(matches!(Command::parse("bw 99999999999999999999999"), Err(EmuError::Usage(_))));
        assert!(matches!(Command::parse("trace"), Err(EmuError::Usage(_))));
    }

    #[test]
    fn test_parse_rate() {
        assert_eq!(parse_rate("1250000").unwrap(), 1_250_000);
        assert!(parse_rate("+5").is_err());
        assert!(parse_rate("12.5").is_err());
        assert!(parse_rate("").is_err());
    }
}
