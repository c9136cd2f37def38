//! In-memory stand-ins for Discord used by the unit tests.

use std::sync::Mutex;

use serenity::async_trait;
use serenity::model::prelude::{
    ChannelId, GuildId, PermissionOverwrite, PermissionOverwriteType, Permissions, RoleId, UserId,
};

use crate::channel_info::{self, ChannelInfo, ChannelKind, ChannelTemplate, WireForumTag};
use crate::guild::GuildApi;
use crate::tags::{TagPatcher, TagPayload};

pub const GUILD: u64 = 1_000;
pub const ACTOR: u64 = 2_000;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateCategory {
        name: String,
    },
    CreateChannel {
        category: ChannelId,
        name: String,
        kind: &'static str,
    },
    Overwrite {
        target: ChannelId,
        principal: PermissionOverwriteType,
        allow: Permissions,
        deny: Permissions,
    },
    Sync {
        channel: ChannelId,
        category: ChannelId,
    },
    CreateRole {
        name: String,
        permissions: Permissions,
    },
    DeleteChannel(ChannelId),
    DeleteRole(RoleId),
}

struct State {
    channels: Vec<ChannelInfo>,
    roles: Vec<RoleId>,
    next_id: u64,
    calls: Vec<Call>,
    manage_roles: bool,
    fail_role_creation: bool,
    fail_channel: Option<String>,
    fail_delete: Option<ChannelId>,
    fail_role_lookup: bool,
    fail_overwrite: Option<PermissionOverwriteType>,
}

pub struct FakeGuild {
    guild_id: GuildId,
    actor: UserId,
    state: Mutex<State>,
}

pub fn channel(id: u64, name: &str, kind: u8, position: u16, parent: Option<u64>) -> ChannelInfo {
    ChannelInfo {
        id: ChannelId::new(id),
        name: name.to_string(),
        kind,
        position,
        parent_id: parent.map(ChannelId::new),
        topic: None,
        nsfw: false,
        rate_limit_per_user: None,
        bitrate: None,
        user_limit: None,
        default_sort_order: None,
        available_tags: Vec::new(),
        permission_overwrites: Vec::new(),
    }
}

pub fn tag(name: &str, emoji_name: Option<&str>) -> WireForumTag {
    WireForumTag {
        name: name.to_string(),
        moderated: false,
        emoji_id: None,
        emoji_name: emoji_name.map(str::to_string),
    }
}

impl FakeGuild {
    pub fn new() -> Self {
        Self {
            guild_id: GuildId::new(GUILD),
            actor: UserId::new(ACTOR),
            state: Mutex::new(State {
                channels: Vec::new(),
                roles: Vec::new(),
                next_id: 10_000,
                calls: Vec::new(),
                manage_roles: true,
                fail_role_creation: false,
                fail_channel: None,
                fail_delete: None,
                fail_role_lookup: false,
                fail_overwrite: None,
            }),
        }
    }

    pub fn with_channel(self, channel: ChannelInfo) -> Self {
        self.state.lock().unwrap().channels.push(channel);
        self
    }

    pub fn with_role(self, role: RoleId) -> Self {
        self.state.lock().unwrap().roles.push(role);
        self
    }

    pub fn without_manage_roles(self) -> Self {
        self.state.lock().unwrap().manage_roles = false;
        self
    }

    pub fn failing_role_creation(self) -> Self {
        self.state.lock().unwrap().fail_role_creation = true;
        self
    }

    /// Makes channel creation fail for the channel with this name.
    pub fn failing_channel(self, name: &str) -> Self {
        self.state.lock().unwrap().fail_channel = Some(name.to_string());
        self
    }

    pub fn failing_delete(self, channel: ChannelId) -> Self {
        self.state.lock().unwrap().fail_delete = Some(channel);
        self
    }

    pub fn failing_role_lookup(self) -> Self {
        self.state.lock().unwrap().fail_role_lookup = true;
        self
    }

    /// Makes every overwrite write for `principal` fail.
    pub fn failing_overwrite(self, principal: PermissionOverwriteType) -> Self {
        self.state.lock().unwrap().fail_overwrite = Some(principal);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn overwrite_writes(&self) -> Vec<(ChannelId, PermissionOverwrite)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Overwrite {
                    target,
                    principal,
                    allow,
                    deny,
                } => Some((
                    target,
                    PermissionOverwrite {
                        allow,
                        deny,
                        kind: principal,
                    },
                )),
                _ => None,
            })
            .collect()
    }

    pub fn has_channel(&self, id: ChannelId) -> bool {
        self.state
            .lock()
            .unwrap()
            .channels
            .iter()
            .any(|c| c.id == id)
    }

    pub fn has_role(&self, id: RoleId) -> bool {
        self.state.lock().unwrap().roles.contains(&id)
    }

    pub fn set_overwrites(&self, id: ChannelId, overwrites: Vec<PermissionOverwrite>) {
        let mut state = self.state.lock().unwrap();
        if let Some(channel) = state.channels.iter_mut().find(|c| c.id == id) {
            channel.permission_overwrites = overwrites;
        }
    }

    pub fn channel_by_id(&self, id: ChannelId) -> Option<ChannelInfo> {
        self.state
            .lock()
            .unwrap()
            .channels
            .iter()
            .find(|c| c.id == id)
            .cloned()
    }

    pub fn channel_named(&self, name: &str) -> Option<ChannelInfo> {
        self.state
            .lock()
            .unwrap()
            .channels
            .iter()
            .find(|c| c.name == name)
            .cloned()
    }
}

impl State {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

#[async_trait]
impl GuildApi for FakeGuild {
    fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    fn actor_id(&self) -> UserId {
        self.actor
    }

    async fn channels(&self) -> anyhow::Result<Vec<ChannelInfo>> {
        Ok(self.state.lock().unwrap().channels.clone())
    }

    async fn create_category(&self, name: &str) -> anyhow::Result<ChannelId> {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        state.calls.push(Call::CreateCategory {
            name: name.to_string(),
        });
        state
            .channels
            .push(channel(id, name, channel_info::CATEGORY, 0, None));
        Ok(ChannelId::new(id))
    }

    async fn create_channel(
        &self,
        category: ChannelId,
        template: &ChannelTemplate,
    ) -> anyhow::Result<ChannelId> {
        let mut state = self.state.lock().unwrap();
        if state.fail_channel.as_deref() == Some(template.name.as_str()) {
            anyhow::bail!("Missing Permissions");
        }

        let id = state.next_id();
        state.calls.push(Call::CreateChannel {
            category,
            name: template.name.clone(),
            kind: template.kind.label(),
        });

        let code = match template.kind {
            ChannelKind::Text { .. } => channel_info::TEXT,
            ChannelKind::Announcement { .. } => channel_info::ANNOUNCEMENT,
            ChannelKind::Voice { .. } => channel_info::VOICE,
            ChannelKind::Forum { .. } => channel_info::FORUM,
        };
        let mut created = channel(
            id,
            &template.name,
            code,
            template.position,
            Some(category.get()),
        );
        if let ChannelKind::Forum {
            default_sort_order, ..
        } = template.kind
        {
            created.default_sort_order = default_sort_order;
        }
        state.channels.push(created);
        Ok(ChannelId::new(id))
    }

    async fn write_overwrite(
        &self,
        target: ChannelId,
        overwrite: PermissionOverwrite,
    ) -> anyhow::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Overwrite {
            target,
            principal: overwrite.kind,
            allow: overwrite.allow,
            deny: overwrite.deny,
        });
        if state.fail_overwrite == Some(overwrite.kind) {
            anyhow::bail!("Missing Access");
        }

        if let Some(channel) = state.channels.iter_mut().find(|c| c.id == target) {
            channel
                .permission_overwrites
                .retain(|o| o.kind != overwrite.kind);
            channel.permission_overwrites.push(overwrite);
        }
        Ok(())
    }

    async fn sync_with_category(
        &self,
        channel: ChannelId,
        category: ChannelId,
    ) -> anyhow::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Sync { channel, category });

        let overwrites = state
            .channels
            .iter()
            .find(|c| c.id == category)
            .map(|c| c.permission_overwrites.clone())
            .unwrap_or_default();
        if let Some(target) = state.channels.iter_mut().find(|c| c.id == channel) {
            target.permission_overwrites = overwrites;
        }
        Ok(())
    }

    async fn can_manage_roles(&self) -> anyhow::Result<bool> {
        Ok(self.state.lock().unwrap().manage_roles)
    }

    async fn create_role(&self, name: &str, permissions: Permissions) -> anyhow::Result<RoleId> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::CreateRole {
            name: name.to_string(),
            permissions,
        });
        if state.fail_role_creation {
            anyhow::bail!("Maximum number of guild roles reached");
        }

        let role = RoleId::new(state.next_id());
        state.roles.push(role);
        Ok(role)
    }

    async fn role_exists(&self, role: RoleId) -> anyhow::Result<bool> {
        if self.state.lock().unwrap().fail_role_lookup {
            anyhow::bail!("503 Service Unavailable");
        }
        Ok(self.has_role(role))
    }

    async fn delete_channel(&self, channel: ChannelId) -> anyhow::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::DeleteChannel(channel));
        if state.fail_delete == Some(channel) {
            anyhow::bail!("Unknown Channel");
        }
        state.channels.retain(|c| c.id != channel);
        Ok(())
    }

    async fn delete_role(&self, role: RoleId) -> anyhow::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::DeleteRole(role));
        state.roles.retain(|r| *r != role);
        Ok(())
    }
}

/// Records every tag update instead of sending it.
pub struct RecordingPatcher {
    succeed: bool,
    calls: Mutex<Vec<(ChannelId, Vec<TagPayload>)>>,
}

impl RecordingPatcher {
    pub fn new() -> Self {
        Self {
            succeed: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            succeed: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(ChannelId, Vec<TagPayload>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TagPatcher for RecordingPatcher {
    async fn patch_tags(&self, channel: ChannelId, tags: &[TagPayload]) -> bool {
        self.calls.lock().unwrap().push((channel, tags.to_vec()));
        self.succeed
    }
}
