use serenity::async_trait;
use serenity::model::prelude::*;
use serenity::prelude::*;

/// Reports the bot's own user once the gateway session is up.
pub struct Handler {
    ready: async_channel::Sender<UserId>,
}

impl Handler {
    pub fn new(ready: async_channel::Sender<UserId>) -> Self {
        Self { ready }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(user = %ready.user.name, guilds = ready.guilds.len(), "Bot is connected!");

        // a reconnect fires `ready` again after the receiver is gone
        if self.ready.try_send(ready.user.id).is_err() {
            debug!("Ready event ignored, the run already started");
        }
    }
}
