use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use crate::control::surface::{ControlSurface, Outcome, HELP_TEXT};
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellExit {
    /// `quit` が入力された
    Quit,
    /// 入力が閉じられた
    EndOfInput,
}

/// 1行1コマンドのオペレーターシェル
pub struct OperatorShell {
    control: ControlSurface,
    prompt: bool,
}

impl OperatorShell {
    pub fn new(control: ControlSurface, prompt: bool) -> Self {
        OperatorShell { control, prompt }
    }

    /// 入力が尽きるか `quit` まで、コマンドを読んで実行する
    ///
    /// コマンドの失敗は出力に表示するだけで、ループは継続します。
    pub async fn run<R, W>(&self, input: R, mut output: W) -> Result<ShellExit>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();

        loop {
            if self.prompt {
                output.write_all(b"> ").await?;
                output.flush().await?;
            }

            let Some(line) = lines.next_line().await? else {
                return Ok(ShellExit::EndOfInput);
            };

            match self.control.dispatch_line(&line).await {
                Ok(Outcome::Done) => {}
                Ok(Outcome::Help) => {
                    output.write_all(HELP_TEXT.as_bytes()).await?;
                    output.write_all(b"\n").await?;
                }
                Ok(Outcome::Shutdown) => return Ok(ShellExit::Quit),
                Err(e) => {
                    output.write_all(format!("error: {}\n", e).as_bytes()).await?;
                }
            }
            output.flush().await?;
        }
    }
}
