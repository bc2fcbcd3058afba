//! The placeholder store: token ids mapped to preserved-block records

use super::{find_tokens, format_token, BlockData, PreservedBlock, Token, TokenKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::{SystemTime, UNIX_EPOCH};

/// Mapping from generated ids to [`PreservedBlock`] records.
///
/// Ids are `<prefix>_<counter>` where the prefix is the creation time in base 36.
/// The counter never goes backwards, so ids stay unique across every pass that
/// shares the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceholderStore {
    prefix: String,
    counter: u64,
    blocks: BTreeMap<String, PreservedBlock>,
}

impl Default for PlaceholderStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaceholderStore {
    pub fn new() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        Self::with_prefix(&to_base36(millis))
    }

    /// Create a store with a fixed id prefix (deterministic ids for tests and snapshots).
    ///
    /// Characters outside `[A-Za-z0-9]` are dropped and an empty prefix becomes `p`,
    /// so ids never begin with `_`.
    pub fn with_prefix(prefix: &str) -> Self {
        let mut clean: String = prefix.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
        if clean.is_empty() {
            clean.push('p');
        }
        PlaceholderStore {
            prefix: clean,
            counter: 0,
            blocks: BTreeMap::new(),
        }
    }

    fn next_id(&mut self) -> String {
        self.counter += 1;
        format!("{}_{}", self.prefix, self.counter)
    }

    /// Record a preserved region and return its id.
    pub fn insert(
        &mut self,
        original: impl Into<String>,
        is_block: bool,
        own_line: bool,
        data: BlockData,
    ) -> String {
        let id = self.next_id();
        let block = PreservedBlock {
            id: id.clone(),
            original: original.into(),
            is_block,
            own_line,
            data,
        };
        tracing::trace!(id = %id, kind = block.kind().as_str(), "placeholder recorded");
        self.blocks.insert(id.clone(), block);
        id
    }

    /// Record a region and return its token text.
    pub fn insert_token(
        &mut self,
        original: impl Into<String>,
        is_block: bool,
        own_line: bool,
        data: BlockData,
    ) -> String {
        let id = self.insert(original, is_block, own_line, data);
        self.token_for(&id).unwrap_or_default()
    }

    /// Put a record back under its own id (used when a rich document carries a
    /// snapshot for a record the store lost).
    pub fn restore_record(&mut self, block: PreservedBlock) {
        self.blocks.insert(block.id.clone(), block);
    }

    pub fn get(&self, id: &str) -> Option<&PreservedBlock> {
        self.blocks.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut PreservedBlock> {
        self.blocks.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.blocks.contains_key(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<PreservedBlock> {
        self.blocks.remove(id)
    }

    /// Keep only the records whose id is in `keep`.
    pub fn retain<'a>(&mut self, keep: impl IntoIterator<Item = &'a str>) {
        let keep: BTreeSet<&str> = keep.into_iter().collect();
        self.blocks.retain(|id, _| keep.contains(id.as_str()));
    }

    /// Keep the records reachable from `roots`, following tokens found in each
    /// record's original text and nested content.
    pub fn retain_reachable<'a>(&mut self, roots: impl IntoIterator<Item = &'a str>) {
        let mut reachable: BTreeSet<String> = BTreeSet::new();
        let mut pending: Vec<String> = roots.into_iter().map(str::to_string).collect();
        while let Some(id) = pending.pop() {
            if !reachable.insert(id.clone()) {
                continue;
            }
            let Some(block) = self.blocks.get(&id) else {
                continue;
            };
            let mut nested = find_tokens(&block.original);
            if let Some(data) = block.shortcode() {
                nested.extend(find_tokens(&data.content));
            }
            if let BlockData::GithubAlert { body, .. } = &block.data {
                nested.extend(find_tokens(body));
            }
            pending.extend(nested.into_iter().map(|token| token.id));
        }
        let before = self.blocks.len();
        self.blocks.retain(|id, _| reachable.contains(id));
        if before != self.blocks.len() {
            tracing::debug!(
                removed = before - self.blocks.len(),
                "dropped unreachable placeholder records"
            );
        }
    }

    /// The token text for a stored record.
    pub fn token_for(&self, id: &str) -> Option<String> {
        self.blocks
            .get(id)
            .map(|block| format_token(block.token_kind(), id))
    }

    /// Parse a string that is exactly one token whose id is known to this store.
    pub fn parse_token(&self, text: &str) -> Option<(Token, &PreservedBlock)> {
        let token = super::parse_token(text.trim())?;
        let block = self.blocks.get(&token.id)?;
        Some((token, block))
    }

    /// Every token in `text`.
    pub fn find_tokens(&self, text: &str) -> Vec<Token> {
        find_tokens(text)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PreservedBlock> {
        self.blocks.values()
    }

    /// Count records per token kind, for diagnostics.
    pub fn kind_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for block in self.blocks.values() {
            *counts.entry(block.kind().as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Drop every record, keeping the id counter so old ids are never reused.
    pub fn clear(&mut self) {
        self.blocks.clear();
    }

    /// Merge another store's records into this one (the other store's ids are kept).
    pub fn absorb(&mut self, other: PlaceholderStore) {
        self.blocks.extend(other.blocks);
    }

    pub fn token_kind_of(&self, id: &str) -> Option<TokenKind> {
        self.blocks.get(id).map(PreservedBlock::token_kind)
    }
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}
