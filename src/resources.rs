use serde::Serialize;
use serenity::model::prelude::{ChannelId, RoleId};

/// Everything one cloning run created, recorded as soon as each resource exists.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct CreatedResources {
    pub category_id: Option<ChannelId>,
    pub channel_ids: Vec<ChannelId>,
    pub role_id: Option<RoleId>,
}

impl CreatedResources {
    pub fn record_category(&mut self, id: ChannelId) {
        self.category_id = Some(id);
    }

    pub fn record_channel(&mut self, id: ChannelId) {
        self.channel_ids.push(id);
    }

    pub fn record_role(&mut self, id: RoleId) {
        self.role_id = Some(id);
    }

    pub fn is_empty(&self) -> bool {
        self.category_id.is_none() && self.channel_ids.is_empty() && self.role_id.is_none()
    }
}
