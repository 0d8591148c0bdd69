use std::{
    path::Path,
    sync::{Arc, RwLock},
};

use anyhow::{Context, Result, anyhow};
use once_cell::sync::Lazy;
use serde::Deserialize;
use tracing::{info, warn};

use crate::{
    context::SetProvider,
    token::{Token, TokenCategory, TokenKind},
    util::fast_map::{FastHashMap, fast_hash_map_with_capacity},
};

const DEFAULT_CONTEXT_MAP: &str = include_str!("context_map.json");

static CONTEXT_MAP: Lazy<RwLock<Arc<ContextMap>>> = Lazy::new(|| {
    let map = ContextMap::embedded().unwrap_or_else(|err| {
        warn!("embedded context map rejected: {:#}", err);
        ContextMap::default()
    });
    info!(triggers = map.len(), "context map loaded");
    RwLock::new(Arc::new(map))
});

/// A token kind, or a whole category written `@name` in the map file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum TokenKey {
    Kind(TokenKind),
    Category(TokenCategory),
}

impl TokenKey {
    pub fn matches(self, token: &Token) -> bool {
        match self {
            TokenKey::Kind(kind) => token.kind == kind,
            TokenKey::Category(category) => token.category == category,
        }
    }
}

impl TryFrom<String> for TokenKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, String> {
        match value.strip_prefix('@') {
            Some(name) => TokenCategory::from_name(name)
                .map(TokenKey::Category)
                .ok_or_else(|| format!("unknown token category `{}`", name)),
            None => TokenKind::try_from(value).map(TokenKey::Kind),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchTarget {
    Single(TokenKey),
    /// Matched backward: the first element is the nearest token.
    Ordered(Vec<TokenKey>),
}

/// One guard on a possibility. With `matches` unset the guard holds when
/// the tokens are absent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawSearchItem")]
pub struct BackwardSearchItem {
    pub target: SearchTarget,
    pub matches: bool,
}

impl BackwardSearchItem {
    /// Key the flat lookup is built on.
    pub fn first_key(&self) -> Option<TokenKey> {
        match &self.target {
            SearchTarget::Single(key) => Some(*key),
            SearchTarget::Ordered(keys) => keys.first().copied(),
        }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSearchItem {
    token: Option<TokenKey>,
    sequence: Option<Vec<TokenKey>>,
    #[serde(rename = "match", default = "default_match")]
    matches: bool,
}

fn default_match() -> bool {
    true
}

impl TryFrom<RawSearchItem> for BackwardSearchItem {
    type Error = String;

    fn try_from(raw: RawSearchItem) -> Result<Self, String> {
        let target = match (raw.token, raw.sequence) {
            (Some(token), None) => SearchTarget::Single(token),
            (None, Some(sequence)) if sequence.len() >= 2 => SearchTarget::Ordered(sequence),
            (None, Some(_)) => return Err("a backward sequence needs at least two tokens".to_string()),
            _ => return Err("a backward item needs exactly one of `token` or `sequence`".to_string()),
        };
        Ok(BackwardSearchItem {
            target,
            matches: raw.matches,
        })
    }
}

/// Candidates offered when a trigger token is found: keywords, provider
/// sets, and the backward guards that select this possibility.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "RawPossibility")]
pub struct ContextPossibility {
    pub tokens: Vec<TokenKind>,
    pub providers: Vec<SetProvider>,
    pub backward: Vec<BackwardSearchItem>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPossibility {
    #[serde(default)]
    tokens: Vec<String>,
    #[serde(default)]
    providers: Vec<SetProvider>,
    #[serde(default)]
    backward: Vec<BackwardSearchItem>,
}

impl TryFrom<RawPossibility> for ContextPossibility {
    type Error = String;

    fn try_from(raw: RawPossibility) -> Result<Self, String> {
        let tokens = raw
            .tokens
            .into_iter()
            .map(TokenKind::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ContextPossibility {
            tokens,
            providers: raw.providers,
            backward: raw.backward,
        })
    }
}

#[derive(Deserialize)]
struct ContextEntry {
    trigger: TokenKey,
    #[serde(default)]
    possibilities: Vec<ContextPossibility>,
}

#[derive(Deserialize)]
struct ContextMapFile {
    contexts: Vec<ContextEntry>,
}

/// Trigger token to candidate contexts. Shared process-wide and replaced
/// whole on reload.
#[derive(Debug, Clone, Default)]
pub struct ContextMap {
    entries: FastHashMap<TokenKey, Arc<[ContextPossibility]>>,
}

impl ContextMap {
    /// The definition compiled into the library.
    pub fn embedded() -> Result<ContextMap> {
        ContextMap::from_json(DEFAULT_CONTEXT_MAP)
    }

    pub fn from_json(json: &str) -> Result<ContextMap> {
        let file: ContextMapFile = serde_json::from_str(json).context("invalid context map definition")?;
        let mut entries: FastHashMap<TokenKey, Vec<ContextPossibility>> =
            fast_hash_map_with_capacity(file.contexts.len());
        for entry in file.contexts {
            entries.entry(entry.trigger).or_default().extend(entry.possibilities);
        }
        Ok(ContextMap {
            entries: entries.into_iter().map(|(key, list)| (key, list.into())).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: TokenKey) -> Option<&Arc<[ContextPossibility]>> {
        self.entries.get(&key)
    }

    /// Possibilities for `token`, by kind first and then by category.
    pub fn possibilities_for(&self, token: &Token) -> Option<&Arc<[ContextPossibility]>> {
        self.get(TokenKey::Kind(token.kind))
            .or_else(|| self.get(TokenKey::Category(token.category)))
    }

    /// The shared map.
    pub fn current() -> Arc<ContextMap> {
        match CONTEXT_MAP.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Replaces the shared map. A definition that fails to parse leaves the
    /// previous map in place.
    pub fn reload_from_str(json: &str) -> Result<()> {
        let map = match ContextMap::from_json(json) {
            Ok(map) => map,
            Err(err) => {
                warn!("context map reload failed, keeping previous map: {:#}", err);
                return Err(err);
            }
        };
        let triggers = map.len();
        let mut guard = CONTEXT_MAP
            .write()
            .map_err(|_| anyhow!("context map lock poisoned"))?;
        *guard = Arc::new(map);
        info!(triggers, "context map reloaded");
        Ok(())
    }

    pub fn reload_from_path(path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read context map {}", path.display()))?;
        ContextMap::reload_from_str(&json).with_context(|| format!("in context map {}", path.display()))
    }

    /// Restores the embedded definition.
    pub fn reset() -> Result<()> {
        ContextMap::reload_from_str(DEFAULT_CONTEXT_MAP)
    }
}
