use crate::client::Client;
use crate::resp::cmd;
use crate::Result;

/// Server-introspection commands.
pub trait ServerCommands {
    /// `PING`, true connectivity check rather than a parsed reply.
    async fn ping(&self) -> Result<()>;
}

impl ServerCommands for Client {
    async fn ping(&self) -> Result<()> {
        let reply: String = self.send(cmd("PING")).await?;
        if reply == "PONG" {
            Ok(())
        } else {
            Err(crate::Error::UnexpectedResponse(format!(
                "expected PONG, got {reply:?}"
            )))
        }
    }
}
