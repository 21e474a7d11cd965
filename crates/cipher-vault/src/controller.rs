//! The access controller: the single entry point for vault requests.
//!
//! Every mutating request follows the same path:
//!
//! 1. Validate input. Bad input is rejected with no audit record and no
//!    reputation change.
//! 2. Take the entry's lock, read the clock, authorize and stage the change
//!    against a shared borrow of the state.
//! 3. Hand the staged change to a spawned task which appends the audit
//!    record and, only if that succeeded, applies the change and scores it.
//!
//! Denied requests take the same path with a `Denied` audit record and a
//! reputation penalty in place of the change. Dropping a request future
//! before step 3 has no effect; from step 3 on the work finishes regardless.

use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, warn};

use cipher_vault_core::{
    Action, AuditFilter, AuditOutcome, CiphertextHandle, Clock, EntryId, EntryView, Identity,
    LogId, SystemClock, Timestamp,
};
use cipher_vault_perms::{PermissionGrant, PermissionLevel};
use cipher_vault_store::AuditStore;

use crate::audit::{AuditCursor, AuditLog};
use crate::config::VaultConfig;
use crate::error::{Result, VaultError};
use crate::events::{Committed, Observed, VaultEvent};
use crate::locks::{EntryGuard, EntryLocks};
use crate::reputation::{ActionOutcome, ReputationEngine};
use crate::request::{Request, RequestPhase};
use crate::state::{Mutation, VaultState, VaultStats};

/// Front door to the vault.
///
/// Cheap to clone; clones share the same state and audit store.
pub struct AccessController<S> {
    inner: Arc<Inner<S>>,
}

impl<S> Clone for AccessController<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<S> {
    state: RwLock<VaultState>,
    audit: AuditLog<S>,
    locks: EntryLocks,
    clock: Arc<dyn Clock>,
    config: VaultConfig,
}

impl<S: AuditStore + 'static> AccessController<S> {
    /// Create a controller on the system clock.
    pub fn new(store: S, config: VaultConfig) -> Self {
        Self::with_clock(store, Arc::new(SystemClock::new()), config)
    }

    /// Create a controller reading time from `clock`.
    pub fn with_clock(store: S, clock: Arc<dyn Clock>, config: VaultConfig) -> Self {
        let reputation = ReputationEngine::new(&config.reputation);
        Self::with_reputation(store, clock, config, reputation)
    }

    /// Create a controller with a custom reputation engine.
    pub fn with_reputation(
        store: S,
        clock: Arc<dyn Clock>,
        config: VaultConfig,
        reputation: ReputationEngine,
    ) -> Self {
        let audit = AuditLog::new(store, config.audit_page_size);
        Self {
            inner: Arc::new(Inner {
                state: RwLock::new(VaultState::with_reputation(reputation)),
                audit,
                locks: EntryLocks::new(),
                clock,
                config,
            }),
        }
    }

    pub fn config(&self) -> &VaultConfig {
        &self.inner.config
    }

    /// The audit log this controller writes to.
    pub fn audit_log(&self) -> &AuditLog<S> {
        &self.inner.audit
    }

    /// Current time according to the controller's clock.
    pub fn now(&self) -> Timestamp {
        self.inner.clock.now()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Entry Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Create an entry owned by `actor`.
    pub async fn create_vault_entry(
        &self,
        actor: Identity,
        data_type: u8,
        ciphertext_handle: CiphertextHandle,
        is_public: bool,
        metadata_hash: impl Into<String>,
    ) -> Result<Committed<EntryId>> {
        let metadata_hash = metadata_hash.into();
        let mut request = Request::new(Action::Create, actor, None);
        request.advance(RequestPhase::Authorizing);

        let now = self.inner.clock.now();
        let mutation = self.inner.stage_create(
            actor,
            data_type,
            ciphertext_handle,
            is_public,
            metadata_hash,
            now,
        )?;
        let entry_id = mutation.entry_id();
        request.set_entry(entry_id);

        let guard = self.inner.locks.acquire(entry_id).await;
        request.advance(RequestPhase::Authorized);
        request.advance(RequestPhase::Mutating);

        let committed = self
            .spawn_commit(request, guard, mutation, actor, now)
            .await?;
        Ok(committed.map(|()| entry_id))
    }

    /// Replace an entry's handle, visibility and metadata. Owner or Write.
    pub async fn update_vault_entry(
        &self,
        actor: Identity,
        entry_id: EntryId,
        ciphertext_handle: CiphertextHandle,
        is_public: bool,
        metadata_hash: impl Into<String>,
    ) -> Result<Committed<()>> {
        let metadata_hash = metadata_hash.into();
        self.execute(Action::Update, actor, entry_id, move |state, now| {
            state.stage_update(
                &actor,
                entry_id,
                ciphertext_handle,
                is_public,
                metadata_hash,
                now,
            )
        })
        .await
    }

    /// Soft-delete an entry. Owner or Admin; repeating it is a recorded no-op.
    pub async fn deactivate_vault_entry(
        &self,
        actor: Identity,
        entry_id: EntryId,
    ) -> Result<Committed<()>> {
        self.execute(Action::Delete, actor, entry_id, move |state, now| {
            state.stage_deactivate(&actor, entry_id, now)
        })
        .await
    }

    /// What `actor` may see of an entry: the full record or a tombstone.
    ///
    /// A read that leaves no record is a lock-free snapshot. A read that will
    /// be recorded, allowed with `audit_reads` set or denied, is staged again
    /// under the entry lock so its log position follows the change it saw.
    pub async fn get_vault_entry_info(
        &self,
        actor: Identity,
        entry_id: EntryId,
    ) -> Result<Observed<EntryView>> {
        let audit_reads = self.inner.config.audit_reads;
        let recorded = |view: &EntryView| view.is_active() && audit_reads;

        match self.inner.stage_read(&actor, entry_id, self.inner.clock.now()) {
            Ok(view) if !recorded(&view) => return Ok(Observed::unrecorded(view)),
            Ok(_) | Err(VaultError::Unauthorized { .. }) => {}
            Err(err) => return Err(err),
        }

        let mut request = Request::new(Action::Read, actor, Some(entry_id));
        let guard = self.inner.locks.acquire(entry_id).await;
        request.advance(RequestPhase::Authorizing);

        let now = self.inner.clock.now();
        match self.inner.stage_read(&actor, entry_id, now) {
            Ok(view) if recorded(&view) => {
                request.advance(RequestPhase::Authorized);
                request.advance(RequestPhase::Mutating);
                let committed = self
                    .spawn_commit(request, guard, Mutation::Read { entry_id }, actor, now)
                    .await?;
                Ok(committed.map(|()| view).into())
            }
            Ok(view) => Ok(Observed::unrecorded(view)),
            Err(VaultError::Unauthorized { required, .. }) => {
                request.advance(RequestPhase::Denied);
                Err(self
                    .spawn_denial(request, guard, actor, entry_id, Action::Read, required, now)
                    .await)
            }
            Err(err) => Err(err),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Permission Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Give `grantee` a level on a live entry for `duration_secs` (0 = no expiry).
    ///
    /// Owner or Admin. An existing grant for the pair is overwritten.
    pub async fn grant_access(
        &self,
        actor: Identity,
        grantee: Identity,
        entry_id: EntryId,
        level: u8,
        duration_secs: u64,
    ) -> Result<Committed<()>> {
        self.execute(Action::GrantAccess, actor, entry_id, move |state, now| {
            state.stage_grant(&actor, grantee, entry_id, level, duration_secs, now)
        })
        .await
    }

    /// Remove `grantee`'s grant. Owner or Admin; an absent grant is not an error.
    pub async fn revoke_access(
        &self,
        actor: Identity,
        grantee: Identity,
        entry_id: EntryId,
    ) -> Result<Committed<()>> {
        self.execute(Action::RevokeAccess, actor, entry_id, move |state, now| {
            state.stage_revoke(&actor, grantee, entry_id, now)
        })
        .await
    }

    /// Check a level on a live entry without recording anything.
    pub async fn is_authorized(
        &self,
        actor: Identity,
        entry_id: EntryId,
        level: PermissionLevel,
    ) -> bool {
        self.inner
            .is_authorized(&actor, entry_id, level, self.inner.clock.now())
    }

    /// Active grants `actor` holds on live entries, by entry id.
    pub async fn list_permissions(&self, actor: Identity) -> Vec<PermissionGrant> {
        self.inner.live_grants(&actor, self.inner.clock.now())
    }

    /// Bitmask of levels `actor` holds on live entries (Read=1, Write=2, Admin=4).
    pub async fn get_user_permissions(&self, actor: Identity) -> u32 {
        self.inner
            .live_grants(&actor, self.inner.clock.now())
            .iter()
            .fold(0, |mask, grant| mask | grant.level.mask_bit())
    }

    pub async fn get_user_reputation(&self, actor: Identity) -> u32 {
        self.inner.read_state().reputation().get(&actor)
    }

    /// Delete lapsed grants. Not audited.
    pub async fn purge_lapsed_grants(&self) -> usize {
        let now = self.inner.clock.now();
        let purged = self.inner.write_state().purge_expired_grants(now);
        if purged > 0 {
            info!(purged, "purged lapsed grants");
        }
        purged
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Audit and Stats
    // ─────────────────────────────────────────────────────────────────────────

    /// Lazy cursor over audit records matching `filter`.
    pub fn audit_trail(&self, filter: AuditFilter) -> AuditCursor<S> {
        self.inner.audit.query(filter)
    }

    pub async fn stats(&self) -> Result<VaultStats> {
        let audit_records = self.inner.audit.len().await?;
        Ok(self.inner.read_state().stats(audit_records))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal
    // ─────────────────────────────────────────────────────────────────────────

    /// Serialize on the entry, stage, then record and commit.
    async fn execute<F>(
        &self,
        action: Action,
        actor: Identity,
        entry_id: EntryId,
        stage: F,
    ) -> Result<Committed<()>>
    where
        F: FnOnce(&VaultState, Timestamp) -> Result<Mutation> + Send,
    {
        let mut request = Request::new(action, actor, Some(entry_id));
        let guard = self.inner.locks.acquire(entry_id).await;
        request.advance(RequestPhase::Authorizing);

        let now = self.inner.clock.now();
        match self.inner.stage(|state| stage(state, now)) {
            Ok(mutation) => {
                request.advance(RequestPhase::Authorized);
                request.advance(RequestPhase::Mutating);
                self.spawn_commit(request, guard, mutation, actor, now)
                    .await
            }
            Err(VaultError::Unauthorized { required, .. }) => {
                request.advance(RequestPhase::Denied);
                Err(self
                    .spawn_denial(request, guard, actor, entry_id, action, required, now)
                    .await)
            }
            Err(err) => {
                debug!(?action, %actor, entry = %entry_id, error = %err, "request rejected");
                Err(err)
            }
        }
    }

    async fn spawn_commit(
        &self,
        request: Request,
        guard: EntryGuard,
        mutation: Mutation,
        actor: Identity,
        now: Timestamp,
    ) -> Result<Committed<()>> {
        let inner = Arc::clone(&self.inner);
        run_detached(async move {
            let _guard = guard;
            inner.record_and_commit(request, mutation, actor, now).await
        })
        .await?
    }

    #[allow(clippy::too_many_arguments)]
    async fn spawn_denial(
        &self,
        request: Request,
        guard: EntryGuard,
        actor: Identity,
        entry_id: EntryId,
        action: Action,
        required: PermissionLevel,
        now: Timestamp,
    ) -> VaultError {
        let inner = Arc::clone(&self.inner);
        let outcome = run_detached(async move {
            let _guard = guard;
            inner
                .record_denial(request, actor, entry_id, action, required, now)
                .await
        })
        .await;

        match outcome {
            Ok(err) | Err(err) => err,
        }
    }
}

/// Run `fut` on its own task so it completes even if the caller goes away.
async fn run_detached<T, F>(fut: F) -> Result<T>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    tokio::spawn(fut)
        .await
        .map_err(|e| VaultError::Aborted(e.to_string()))
}

impl<S> Inner<S> {
    fn read_state(&self) -> RwLockReadGuard<'_, VaultState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, VaultState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn stage<F>(&self, f: F) -> Result<Mutation>
    where
        F: FnOnce(&VaultState) -> Result<Mutation>,
    {
        f(&self.read_state())
    }

    fn stage_create(
        &self,
        owner: Identity,
        data_type: u8,
        ciphertext_handle: CiphertextHandle,
        is_public: bool,
        metadata_hash: String,
        now: Timestamp,
    ) -> Result<Mutation> {
        self.write_state().stage_create(
            owner,
            data_type,
            ciphertext_handle,
            is_public,
            metadata_hash,
            now,
        )
    }

    fn stage_read(&self, actor: &Identity, entry_id: EntryId, now: Timestamp) -> Result<EntryView> {
        self.read_state().stage_read(actor, entry_id, now)
    }

    fn is_authorized(
        &self,
        actor: &Identity,
        entry_id: EntryId,
        level: PermissionLevel,
        now: Timestamp,
    ) -> bool {
        let state = self.read_state();
        state
            .entries()
            .get_active(entry_id)
            .map_or(false, |entry| {
                state.permissions().is_authorized(actor, entry, level, now)
            })
    }

    fn live_grants(&self, actor: &Identity, now: Timestamp) -> Vec<PermissionGrant> {
        let state = self.read_state();
        state
            .permissions()
            .list_permissions(actor, now)
            .into_iter()
            .filter(|grant| state.entries().get_active(grant.entry_id).is_some())
            .cloned()
            .collect()
    }

    /// Apply a staged mutation whose audit record is already written.
    fn commit(
        &self,
        actor: Identity,
        mutation: &Mutation,
        log_id: LogId,
        now: Timestamp,
    ) -> Vec<VaultEvent> {
        let mut state = self.write_state();
        let mut events = Vec::with_capacity(3);
        events.extend(state.apply(actor, mutation, now));
        events.push(VaultEvent::AuditLogCreated {
            log_id,
            entry_id: mutation.entry_id(),
            actor,
        });
        let (_, reputation) = state.record_outcome(actor, mutation.action(), ActionOutcome::Success);
        events.extend(reputation);
        events
    }

    /// Score a recorded denial, returning the new score and its events.
    fn penalize(
        &self,
        actor: Identity,
        entry_id: EntryId,
        action: Action,
        log_id: LogId,
    ) -> (u32, Vec<VaultEvent>) {
        let (score, reputation) = self
            .write_state()
            .record_outcome(actor, action, ActionOutcome::Unauthorized);
        let mut events = Vec::with_capacity(2);
        events.push(VaultEvent::AuditLogCreated {
            log_id,
            entry_id,
            actor,
        });
        events.extend(reputation);
        (score, events)
    }
}

impl<S: AuditStore> Inner<S> {
    async fn record_and_commit(
        &self,
        mut request: Request,
        mutation: Mutation,
        actor: Identity,
        now: Timestamp,
    ) -> Result<Committed<()>> {
        let action = mutation.action();
        let entry_id = mutation.entry_id();
        request.advance(RequestPhase::Recording);

        let log_id = match self
            .audit
            .append(entry_id, actor, action, AuditOutcome::Success, now)
            .await
        {
            Ok(log_id) => log_id,
            Err(source) => {
                warn!(
                    ?action,
                    %actor,
                    entry = %entry_id,
                    phase = ?request.phase(),
                    error = %source,
                    "audit append failed; request abandoned"
                );
                request.advance(RequestPhase::Failed);
                return Err(VaultError::StorageFault {
                    entry_id,
                    actor,
                    action,
                    source,
                });
            }
        };

        let events = self.commit(actor, &mutation, log_id, now);
        request.advance(RequestPhase::Completed);
        info!(?action, %actor, entry = %entry_id, %log_id, "request committed");

        Ok(Committed {
            value: (),
            log_id,
            events,
        })
    }

    async fn record_denial(
        &self,
        mut request: Request,
        actor: Identity,
        entry_id: EntryId,
        action: Action,
        required: PermissionLevel,
        now: Timestamp,
    ) -> VaultError {
        request.advance(RequestPhase::Recording);

        match self
            .audit
            .append(entry_id, actor, action, AuditOutcome::Denied, now)
            .await
        {
            Ok(log_id) => {
                let (reputation, events) = self.penalize(actor, entry_id, action, log_id);
                request.advance(RequestPhase::Completed);
                warn!(?action, %actor, entry = %entry_id, %log_id, reputation, "request denied");
                VaultError::Unauthorized {
                    actor,
                    entry_id,
                    required,
                    log_id: Some(log_id),
                    reputation: Some(reputation),
                    events,
                }
            }
            Err(source) => {
                warn!(
                    ?action,
                    %actor,
                    entry = %entry_id,
                    error = %source,
                    "audit append failed while recording a denial"
                );
                request.advance(RequestPhase::Failed);
                VaultError::StorageFault {
                    entry_id,
                    actor,
                    action,
                    source,
                }
            }
        }
    }
}
