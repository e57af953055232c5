use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::ItemId;

/// Who can see a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Unlisted,
    Private,
    Direct,
    #[serde(other)]
    Unknown,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Unlisted => "unlisted",
            Visibility::Private => "private",
            Visibility::Direct => "direct",
            Visibility::Unknown => "unknown",
        }
    }
}

/// A profile metadata row ("Website: https://...").
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Field {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub verified_at: Option<DateTime<Utc>>,
}

/// Account summary as embedded in posts or fetched directly.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Account {
    pub id: ItemId,
    #[serde(default)]
    pub username: String,
    /// Handle, `user` for local accounts or `user@domain` for remote ones.
    pub acct: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub avatar_static: String,
    /// Bio, as server-rendered HTML.
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub bot: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub statuses_count: u64,
    #[serde(default)]
    pub following_count: u64,
    #[serde(default)]
    pub followers_count: u64,
}

impl Account {
    pub fn new(id: impl Into<ItemId>, acct: impl Into<String>) -> Self {
        let acct = acct.into();
        Self {
            id: id.into(),
            username: acct.split('@').next().unwrap_or_default().to_string(),
            display_name: acct.clone(),
            acct,
            avatar_static: String::new(),
            note: String::new(),
            fields: Vec::new(),
            bot: false,
            created_at: None,
            statuses_count: 0,
            following_count: 0,
            followers_count: 0,
        }
    }

    /// Display name, falling back to the handle when the profile leaves it blank.
    pub fn name(&self) -> &str {
        if self.display_name.trim().is_empty() {
            &self.acct
        } else {
            &self.display_name
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct MediaDimensions {
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MediaMeta {
    #[serde(default)]
    pub original: Option<MediaDimensions>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MediaAttachment {
    pub id: ItemId,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub meta: Option<MediaMeta>,
}

impl MediaAttachment {
    /// Preview image if the server generated one, else the full-size URL.
    pub fn image_url(&self) -> Option<&str> {
        [self.preview_url.as_deref(), self.url.as_deref()]
            .into_iter()
            .flatten()
            .find(|url| !url.is_empty())
    }

    /// Original pixel size, when the server reported both axes.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        let original = self.meta.as_ref()?.original?;
        match (original.width?, original.height?) {
            (w, h) if w > 0 && h > 0 => Some((w, h)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PollOption {
    pub title: String,
    #[serde(default)]
    pub votes_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Poll {
    pub options: Vec<PollOption>,
    #[serde(default)]
    pub multiple: bool,
    #[serde(default)]
    pub voted: Option<bool>,
    #[serde(default)]
    pub own_votes: Vec<usize>,
    #[serde(default)]
    pub voters_count: Option<u64>,
}

/// Link preview attached to a post.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Card {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(default)]
    pub url: String,
}

/// A post ("status") as returned by timeline, context and streaming endpoints.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Post {
    pub id: ItemId,
    pub account: Account,
    pub created_at: DateTime<Utc>,
    /// The boosted post when this entry is a boost.
    #[serde(default)]
    pub reblog: Option<Box<Post>>,
    #[serde(default)]
    pub in_reply_to_id: Option<ItemId>,
    #[serde(default)]
    pub media_attachments: Vec<MediaAttachment>,
    #[serde(default)]
    pub poll: Option<Poll>,
    #[serde(default)]
    pub card: Option<Card>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub sensitive: bool,
    /// Body, as server-rendered HTML.
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub replies_count: u64,
    #[serde(default)]
    pub reblogs_count: u64,
    #[serde(default)]
    pub favourites_count: u64,
}

impl Post {
    pub fn new(id: impl Into<ItemId>, account: Account) -> Self {
        Self {
            id: id.into(),
            account,
            created_at: DateTime::<Utc>::default(),
            reblog: None,
            in_reply_to_id: None,
            media_attachments: Vec::new(),
            poll: None,
            card: None,
            visibility: Visibility::Public,
            sensitive: false,
            content: String::new(),
            tags: Vec::new(),
            url: None,
            replies_count: 0,
            reblogs_count: 0,
            favourites_count: 0,
        }
    }

    /// The post whose content should be displayed: the boost target for
    /// boosts, otherwise the post itself.
    pub fn original(&self) -> &Post {
        self.reblog.as_deref().unwrap_or(self)
    }

    pub fn boost_target_id(&self) -> Option<&ItemId> {
        self.reblog.as_ref().map(|post| &post.id)
    }

    pub fn is_boost(&self) -> bool {
        self.reblog.is_some()
    }

    pub fn is_reply(&self) -> bool {
        self.in_reply_to_id.is_some()
    }
}

/// A push notification delivered over the streaming connection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Notification {
    #[serde(rename = "type")]
    pub kind: String,
    pub account: Account,
}
