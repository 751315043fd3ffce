//! Pagination controller: the consumer-facing view over the sync repository.
//!
//! The controller owns the accumulated user list and all loading flags. Page
//! loads and user lookups run as spawned Tokio tasks and report back through
//! an MPSC channel; results only touch controller state when the owner drains
//! them with `check_background_tasks` or awaits them with `next_update` /
//! `settle`. Every request carries a generation number so that results
//! arriving after a `refresh` (or a newer `select_user`) are dropped.

use std::collections::HashSet;

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::models::{User, UserPage};
use crate::repository::{SyncError, SyncRepository};

// ============================================================================
// Constants
// ============================================================================

/// Default number of users requested per page
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Buffer size for the background result channel.
/// Holds one page load plus a handful of lookups and stale stragglers.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Message shown when the very first page comes back empty
pub const NO_USERS_MESSAGE: &str = "No users found";

// ============================================================================
// Observable State
// ============================================================================

/// What a consumer should render for the user list.
#[derive(Debug, Clone, PartialEq)]
pub enum ListState {
    Loading,
    Success { users: Vec<User>, has_more: bool },
    Error { message: String },
}

/// Progress of the single-user lookup started by `select_user`.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    None,
    Loading(i64),
    Found(User),
}

/// Results sent back from background tasks.
enum LoadResult {
    /// A page load finished (generation, result)
    Page(u64, Result<UserPage, SyncError>),
    /// A user lookup finished (generation, id, result)
    User(u64, i64, Result<User, SyncError>),
}

// ============================================================================
// Controller
// ============================================================================

pub struct UserListController {
    repo: SyncRepository,
    page_size: u32,

    // Accumulated view
    users: Vec<User>,
    seen_ids: HashSet<i64>,
    current_page: u32,
    has_more: bool,
    in_flight: bool,
    generation: u64,
    state: ListState,
    state_tx: watch::Sender<ListState>,

    // Single-user selection
    selection: Selection,
    selection_generation: u64,
    selected_tx: watch::Sender<Option<User>>,

    result_tx: mpsc::Sender<LoadResult>,
    result_rx: mpsc::Receiver<LoadResult>,
}

impl UserListController {
    /// Create a controller and immediately start loading the first page.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(repo: SyncRepository, page_size: u32) -> Self {
        let (result_tx, result_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let (state_tx, _) = watch::channel(ListState::Loading);
        let (selected_tx, _) = watch::channel(None);

        let mut controller = Self {
            repo,
            page_size: page_size.max(1),
            users: Vec::new(),
            seen_ids: HashSet::new(),
            current_page: 0,
            has_more: true,
            in_flight: false,
            generation: 0,
            state: ListState::Loading,
            state_tx,
            selection: Selection::None,
            selection_generation: 0,
            selected_tx,
            result_tx,
            result_rx,
        };
        controller.load_next_page();
        controller
    }

    // ===== Accessors =====

    pub fn state(&self) -> &ListState {
        &self.state
    }

    /// Watch the list state; the receiver sees every transition's latest value
    pub fn subscribe(&self) -> watch::Receiver<ListState> {
        self.state_tx.subscribe()
    }

    /// Users accumulated so far, including while an error is displayed
    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selected_user(&self) -> Option<&User> {
        match &self.selection {
            Selection::Found(user) => Some(user),
            _ => None,
        }
    }

    pub fn subscribe_selected(&self) -> watch::Receiver<Option<User>> {
        self.selected_tx.subscribe()
    }

    /// True while a page load or a user lookup is outstanding
    pub fn is_busy(&self) -> bool {
        self.in_flight || matches!(self.selection, Selection::Loading(_))
    }

    // ===== Commands =====

    /// Start loading the next page. Does nothing while a load is already
    /// running or after the last page has been seen.
    pub fn load_next_page(&mut self) {
        if self.in_flight {
            debug!(page = self.current_page, "Page load already in flight");
            return;
        }
        if !self.has_more {
            debug!("No more pages to load");
            return;
        }

        self.in_flight = true;
        let limit = self.page_size;
        let skip = self.current_page.saturating_mul(self.page_size);
        let generation = self.generation;
        let repo = self.repo.clone();
        let tx = self.result_tx.clone();

        debug!(page = self.current_page, limit, skip, "Loading page");
        tokio::spawn(async move {
            let result = repo.get_page(limit, skip).await;
            Self::send_result(&tx, LoadResult::Page(generation, result)).await;
        });
    }

    /// Discard everything loaded so far and load the first page again.
    /// Any load still running is orphaned and its result dropped.
    pub fn refresh(&mut self) {
        info!("Refreshing user list");
        self.generation = self.generation.wrapping_add(1);
        self.current_page = 0;
        self.has_more = true;
        self.in_flight = false;
        self.users.clear();
        self.seen_ids.clear();
        self.set_state(ListState::Loading);
        self.load_next_page();
    }

    /// Start looking up a single user. A newer selection supersedes an older
    /// one that has not finished yet.
    pub fn select_user(&mut self, id: i64) {
        self.selection_generation = self.selection_generation.wrapping_add(1);
        self.selection = Selection::Loading(id);
        self.selected_tx.send_replace(None);

        let generation = self.selection_generation;
        let repo = self.repo.clone();
        let tx = self.result_tx.clone();

        tokio::spawn(async move {
            let result = repo.get_user_by_id(id).await;
            Self::send_result(&tx, LoadResult::User(generation, id, result)).await;
        });
    }

    pub fn clear_selection(&mut self) {
        self.selection_generation = self.selection_generation.wrapping_add(1);
        self.selection = Selection::None;
        self.selected_tx.send_replace(None);
    }

    // ===== Background Results =====

    /// Helper to send results, logging any channel errors
    async fn send_result(tx: &mpsc::Sender<LoadResult>, result: LoadResult) {
        if let Err(e) = tx.send(result).await {
            error!(error = %e, "Failed to send load result - channel closed");
        }
    }

    /// Apply every result that has already arrived, without waiting.
    /// Returns the number of results processed (stale ones included).
    pub fn check_background_tasks(&mut self) -> usize {
        let mut results = Vec::new();
        while let Ok(result) = self.result_rx.try_recv() {
            results.push(result);
        }

        let count = results.len();
        for result in results {
            self.process_result(result);
        }
        count
    }

    /// Wait for the next background result and apply it.
    /// Returns false immediately when nothing is outstanding.
    pub async fn next_update(&mut self) -> bool {
        if !self.is_busy() {
            return false;
        }
        match self.result_rx.recv().await {
            Some(result) => {
                self.process_result(result);
                true
            }
            None => false,
        }
    }

    /// Wait until no page load or lookup is outstanding
    pub async fn settle(&mut self) {
        while self.next_update().await {}
    }

    fn process_result(&mut self, result: LoadResult) {
        match result {
            LoadResult::Page(generation, result) => {
                if generation != self.generation {
                    debug!(generation, current = self.generation, "Discarding stale page");
                    return;
                }
                self.in_flight = false;
                match result {
                    Ok(page) => self.apply_page(page),
                    Err(e) => {
                        warn!(page = self.current_page, error = %e, "Page load failed");
                        self.set_state(ListState::Error {
                            message: e.to_string(),
                        });
                    }
                }
            }
            LoadResult::User(generation, id, result) => {
                if generation != self.selection_generation {
                    debug!(id, "Discarding superseded user lookup");
                    return;
                }
                match result {
                    Ok(user) => {
                        self.selected_tx.send_replace(Some(user.clone()));
                        self.selection = Selection::Found(user);
                    }
                    Err(e) => {
                        warn!(id, error = %e, "Failed to load user");
                        self.selection = Selection::None;
                    }
                }
            }
        }
    }

    fn apply_page(&mut self, page: UserPage) {
        self.has_more = page.has_more();
        self.current_page += 1;

        let received = page.users.len();
        for user in page.users {
            if self.seen_ids.insert(user.id) {
                self.users.push(user);
            }
        }
        debug!(
            received,
            total = self.users.len(),
            has_more = self.has_more,
            "Page applied"
        );

        if self.users.is_empty() {
            self.set_state(ListState::Error {
                message: NO_USERS_MESSAGE.to_string(),
            });
        } else {
            self.set_state(ListState::Success {
                users: self.users.clone(),
                has_more: self.has_more,
            });
        }
    }

    fn set_state(&mut self, state: ListState) {
        self.state_tx.send_replace(state.clone());
        self.state = state;
    }
}

// ============================================================================
// Tests
// ============================================================================
