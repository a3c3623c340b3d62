//! The file agent orchestrator.
//!
//! Owns the record collection and the render cache, turns picks and drops
//! into validated records, reconciles the list after every structural
//! change, and drives the upload lifecycle (see `lifecycle`).

use std::sync::{Arc, Mutex};

use fileagent_record::{FileHandle, FileRecord, RecordId, ingest};
use fileagent_uploader::{RequestConfigurator, Uploader};
use tracing::{debug, info, warn};

use crate::config::AgentConfig;
use crate::drag::{DragState, DragTracker};
use crate::drop::{DropPayload, DropResolver, FsDropResolver};
use crate::error::AgentError;
use crate::events::{AgentEvents, InputChange};
use crate::lifecycle::InFlight;
use crate::preview::{FilePreview, PreviewProps};
use crate::reconcile::{RenderCache, RenderContext};
use crate::slots::{SlotName, Slots};
use crate::surface::{MemorySurface, NodeId, SharedSurface};
use crate::thumbnail::{ThumbnailExtractor, spawn_video_thumbnail};
use crate::transition::{InstantTransitions, TransitionDriver, TransitionPlan};
use crate::wrapper::{WrapperState, drag_target};

/// The record collection, shared with the caller.
///
/// Only the agent changes its structure, and only in place (insert/remove),
/// so references held elsewhere stay valid across a render.
pub type SharedRecords = Arc<Mutex<Vec<Arc<FileRecord>>>>;

/// Render-side state; never exposed.
#[derive(Default)]
pub(crate) struct ViewState {
    pub cache: RenderCache,
    pub drag: DragTracker,
    pub sorting: bool,
    pub sorting_active: bool,
}

impl ViewState {
    fn wrapper<'a>(&self, config: &'a AgentConfig, count: usize) -> WrapperState<'a> {
        WrapperState {
            config,
            count,
            dragging: self.drag.is_dragging(),
            sorting: self.sorting,
            sorting_active: self.sorting_active,
        }
    }
}

/// File selection and upload orchestrator.
///
/// Locks are always taken in the order view, records, surface. Records are never
/// mutated while the surface is held, because their change handlers patch
/// the surface.
pub struct FileAgent {
    pub(crate) config: Mutex<AgentConfig>,
    pub(crate) records: SharedRecords,
    pub(crate) uploader: Option<Arc<dyn Uploader>>,
    /// Request configurator used by the auto lifecycle.
    pub(crate) configure: Option<RequestConfigurator>,
    pub(crate) thumbnails: Option<Arc<dyn ThumbnailExtractor>>,
    pub(crate) drop_resolver: Arc<dyn DropResolver>,
    pub(crate) surface: SharedSurface,
    pub(crate) transitions: Arc<dyn TransitionDriver>,
    pub(crate) events: AgentEvents,
    pub(crate) slots: Slots,
    pub(crate) view: Mutex<ViewState>,
    pub(crate) in_flight: InFlight,
}

pub struct FileAgentBuilder {
    config: AgentConfig,
    records: Option<SharedRecords>,
    uploader: Option<Arc<dyn Uploader>>,
    configure: Option<RequestConfigurator>,
    thumbnails: Option<Arc<dyn ThumbnailExtractor>>,
    drop_resolver: Option<Arc<dyn DropResolver>>,
    surface: Option<SharedSurface>,
    transitions: Option<Arc<dyn TransitionDriver>>,
    events: AgentEvents,
    slots: Slots,
}

impl FileAgentBuilder {
    /// Shares an existing collection instead of starting empty.
    pub fn records(mut self, records: SharedRecords) -> Self {
        self.records = Some(records);
        self
    }

    pub fn uploader(mut self, uploader: Arc<dyn Uploader>) -> Self {
        self.uploader = Some(uploader);
        self
    }

    pub fn request_configurator(mut self, configure: RequestConfigurator) -> Self {
        self.configure = Some(configure);
        self
    }

    pub fn thumbnails(mut self, extractor: Arc<dyn ThumbnailExtractor>) -> Self {
        self.thumbnails = Some(extractor);
        self
    }

    pub fn drop_resolver(mut self, resolver: Arc<dyn DropResolver>) -> Self {
        self.drop_resolver = Some(resolver);
        self
    }

    pub fn surface(mut self, surface: SharedSurface) -> Self {
        self.surface = Some(surface);
        self
    }

    pub fn transitions(mut self, driver: Arc<dyn TransitionDriver>) -> Self {
        self.transitions = Some(driver);
        self
    }

    pub fn events(mut self, events: AgentEvents) -> Self {
        self.events = events;
        self
    }

    pub fn slots(mut self, slots: Slots) -> Self {
        self.slots = slots;
        self
    }

    /// Validates the configuration and performs the first render.
    pub fn build(self) -> Result<FileAgent, AgentError> {
        self.config.validate()?;
        let surface: SharedSurface = match self.surface {
            Some(surface) => surface,
            None => MemorySurface::shared(),
        };
        let drop_resolver: Arc<dyn DropResolver> = match self.drop_resolver {
            Some(resolver) => resolver,
            None => Arc::new(FsDropResolver),
        };
        let transitions: Arc<dyn TransitionDriver> = match self.transitions {
            Some(driver) => driver,
            None => Arc::new(InstantTransitions),
        };
        let agent = FileAgent {
            config: Mutex::new(self.config),
            records: self.records.unwrap_or_default(),
            uploader: self.uploader,
            configure: self.configure,
            thumbnails: self.thumbnails,
            drop_resolver,
            surface,
            transitions,
            events: self.events,
            slots: self.slots,
            view: Mutex::new(ViewState::default()),
            in_flight: InFlight::default(),
        };
        agent.render();
        Ok(agent)
    }
}

fn preview_props(config: &AgentConfig) -> PreviewProps {
    PreviewProps {
        average_color: config.average_color,
        deletable: config.deletable,
        editable: config.editable,
        linkable: config.linkable,
        disabled: config.disabled,
        meta: config.meta,
    }
}

/// Drops duplicates and trims the selection to the remaining capacity.
///
/// Single mode keeps only the first file.
fn select_batch(
    config: &AgentConfig,
    existing: &[Arc<FileRecord>],
    files: Vec<FileHandle>,
) -> Vec<FileHandle> {
    if !config.has_multiple() {
        return files.into_iter().take(1).collect();
    }

    let incoming = files.len();
    let mut batch: Vec<FileHandle> = files
        .into_iter()
        .filter(|file| !existing.iter().any(|r| r.file().same_file(file)))
        .collect();
    if batch.len() < incoming {
        debug!(skipped = incoming - batch.len(), "skipping files already added");
    }

    if let Some(max) = config.file_cap() {
        let room = max.saturating_sub(existing.len());
        if batch.len() > room {
            debug!(kept = room, dropped = batch.len() - room, "truncating batch to capacity");
            batch.truncate(room);
        }
    }
    batch
}

impl FileAgent {
    pub fn builder(config: AgentConfig) -> FileAgentBuilder {
        FileAgentBuilder {
            config,
            records: None,
            uploader: None,
            configure: None,
            thumbnails: None,
            drop_resolver: None,
            surface: None,
            transitions: None,
            events: AgentEvents::default(),
            slots: Slots::default(),
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Snapshot of the current configuration.
    pub fn config(&self) -> AgentConfig {
        self.config.lock().unwrap().clone()
    }

    /// Replaces the configuration and re-renders.
    pub fn set_config(&self, config: AgentConfig) -> Result<(), AgentError> {
        config.validate()?;
        *self.config.lock().unwrap() = config;
        self.render();
        Ok(())
    }

    /// Snapshot of the collection, in order.
    pub fn records(&self) -> Vec<Arc<FileRecord>> {
        self.records.lock().unwrap().clone()
    }

    pub fn records_handle(&self) -> SharedRecords {
        self.records.clone()
    }

    /// Records without a validation error.
    pub fn valid_records(&self) -> Vec<Arc<FileRecord>> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.is_valid())
            .cloned()
            .collect()
    }

    pub fn record(&self, id: RecordId) -> Option<Arc<FileRecord>> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id() == id)
            .cloned()
    }

    pub(crate) fn find(&self, id: RecordId) -> Result<Arc<FileRecord>, AgentError> {
        self.record(id).ok_or(AgentError::NotFound(id))
    }

    pub fn surface(&self) -> SharedSurface {
        self.surface.clone()
    }

    /// Node currently rendering `id`.
    pub fn node_of(&self, id: RecordId) -> Option<NodeId> {
        self.view.lock().unwrap().cache.node_of(id)
    }

    /// Record rendered by `node`, including nodes still leaving.
    pub fn record_at(&self, node: NodeId) -> Option<Arc<FileRecord>> {
        self.view.lock().unwrap().cache.record_at(node)
    }

    /// Built-in preview bound to `id`; `None` when a slot renders it.
    pub fn preview(&self, id: RecordId) -> Option<Arc<FilePreview>> {
        self.view.lock().unwrap().cache.preview_of(id)
    }

    pub fn drag_state(&self) -> DragState {
        let valid = self.config().accepts_drop(self.records.lock().unwrap().len());
        self.view.lock().unwrap().drag.state(valid)
    }

    pub(crate) fn fire_input(&self) {
        if let Some(hook) = &self.events.on_input {
            let records = self.records();
            hook(&records);
        }
    }

    // -----------------------------------------------------------------------
    // Rendering
    // -----------------------------------------------------------------------

    /// Brings the surface in line with the collection.
    ///
    /// Wrapper classes, help text, static slots and input attributes are
    /// refreshed on every pass; the list itself is reconciled and the
    /// resulting plan handed to the transition driver.
    ///
    /// The collection is read only once the view is held, so overlapping
    /// passes always reconcile against the latest records.
    pub fn render(&self) -> TransitionPlan {
        let config = self.config();
        let mut view = self.view.lock().unwrap();
        let records = self.records();
        let mut surface = self.surface.lock().unwrap();

        let wrapper = view.wrapper(&config, records.len());
        wrapper.paint(&mut *surface);
        surface.set_help_text(&config.help_text());
        for name in SlotName::ALL {
            if let Some(content) = self.slots.get(name) {
                surface.fill_slot(name, content);
            }
        }

        let ctx = RenderContext {
            props: preview_props(&config),
            slots: &self.slots,
            theme: config.theme,
        };
        let plan = view
            .cache
            .reconcile(&mut *surface, &self.surface, &records, &ctx);
        for node in self.transitions.apply(&mut *surface, &plan) {
            view.cache.finish_leaving(&mut *surface, node);
        }

        surface.set_input(&wrapper.input_attributes());
        plan
    }

    /// Unbinds every preview and empties the list. The next render
    /// rebuilds it from scratch.
    pub fn detach(&self) {
        let mut view = self.view.lock().unwrap();
        view.cache.clear(&mut *self.surface.lock().unwrap());
        debug!("render cache cleared");
    }

    /// Host callback: `node` finished its transition.
    ///
    /// Returns `true` if a leaving node was dropped.
    pub fn transition_end(&self, node: NodeId) -> bool {
        let mut view = self.view.lock().unwrap();
        let mut surface = self.surface.lock().unwrap();
        self.transitions.settle(&mut *surface, node);
        view.cache.finish_leaving(&mut *surface, node)
    }

    // -----------------------------------------------------------------------
    // Ingestion
    // -----------------------------------------------------------------------

    /// Validates and adds a selection, then auto-uploads it.
    ///
    /// Returns the records actually added. Disabled or readonly agents,
    /// full collections and batches left empty after de-duplication are
    /// no-ops.
    pub async fn handle_files(
        &self,
        files: Vec<FileHandle>,
    ) -> Result<Vec<Arc<FileRecord>>, AgentError> {
        let config = self.config();
        if !config.is_active() {
            debug!("agent inactive, ignoring files");
            return Ok(Vec::new());
        }
        let existing = self.records();
        if config.has_multiple() && !config.can_add_more(existing.len()) {
            debug!(count = existing.len(), "collection full, ignoring files");
            return Ok(Vec::new());
        }

        let batch = select_batch(&config, &existing, files);
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let options = config.validation_options()?;
        let ingested = ingest(batch, &options).await;

        if let Some(extractor) = &self.thumbnails {
            for record in &ingested {
                spawn_video_thumbnail(extractor.clone(), record.clone(), config.average_color);
            }
        }

        let added = self.apply_batch(&config, ingested);
        if added.is_empty() {
            return Ok(added);
        }
        info!(
            files = added.len(),
            invalid = added.iter().filter(|r| !r.is_valid()).count(),
            "files added"
        );

        self.fire_input();
        if let Some(hook) = &self.events.on_select {
            hook(&added);
        }
        self.render();

        if let Err(e) = self.auto_upload(&added).await {
            debug!(error = %e, "auto upload did not complete");
        }
        Ok(added)
    }

    /// Splices an ingested batch into the collection.
    ///
    /// Duplicates and capacity are checked again here: another batch may
    /// have landed while this one was being validated.
    fn apply_batch(
        &self,
        config: &AgentConfig,
        ingested: Vec<Arc<FileRecord>>,
    ) -> Vec<Arc<FileRecord>> {
        let mut records = self.records.lock().unwrap();

        if !config.has_multiple() {
            let Some(record) = ingested.into_iter().next() else {
                return Vec::new();
            };
            if records.is_empty() {
                records.push(record.clone());
            } else {
                records[0] = record.clone();
            }
            return vec![record];
        }

        let before = records.len();
        let mut added = Vec::with_capacity(ingested.len());
        for record in ingested {
            if records[..before]
                .iter()
                .any(|r| r.file().same_file(record.file()))
            {
                debug!(file = %record.file().name(), "file added concurrently, skipping");
                continue;
            }
            if let Some(max) = config.file_cap()
                && records.len() >= max
            {
                debug!(max, "collection filled up while validating");
                break;
            }
            records.push(record.clone());
            added.push(record);
        }
        added
    }

    /// File input `change` handler.
    pub async fn files_changed(
        &self,
        change: InputChange,
    ) -> Result<Vec<Arc<FileRecord>>, AgentError> {
        if let Some(hook) = &self.events.on_change {
            hook(&change);
        }
        if change.files.is_empty() {
            return Ok(Vec::new());
        }
        let result = self.handle_files(change.files).await;
        // Clear the selection so picking the same file again fires.
        self.surface.lock().unwrap().reset_input();
        result
    }

    // -----------------------------------------------------------------------
    // Drag and drop
    // -----------------------------------------------------------------------

    pub fn drag_enter(&self) -> DragState {
        self.update_drag(DragTracker::enter)
    }

    pub fn drag_over(&self) -> DragState {
        self.update_drag(DragTracker::over)
    }

    pub fn drag_leave(&self) -> DragState {
        self.update_drag(DragTracker::leave)
    }

    fn update_drag(&self, step: impl FnOnce(&mut DragTracker) -> bool) -> DragState {
        let config = self.config();
        if drag_target(&config).is_none() {
            return DragState::Idle;
        }
        let count = self.records.lock().unwrap().len();
        let mut view = self.view.lock().unwrap();
        let valid = config.accepts_drop(count);
        if step(&mut view.drag) {
            let wrapper = view.wrapper(&config, count);
            wrapper.paint(&mut *self.surface.lock().unwrap());
            debug!(dragging = wrapper.dragging, valid, "drag status changed");
        }
        view.drag.state(valid)
    }

    /// Drop handler: resets the drag state, resolves the payload and
    /// ingests the files.
    pub async fn drop_files(
        &self,
        payload: DropPayload,
    ) -> Result<Vec<Arc<FileRecord>>, AgentError> {
        self.update_drag(DragTracker::drop_reset);

        let config = self.config();
        if !config.is_active() {
            debug!("agent inactive, ignoring drop");
            return Ok(Vec::new());
        }

        let mut files = match self.drop_resolver.resolve(&payload).await {
            Ok(files) => files,
            Err(e) => {
                warn!(error = %e, "drop resolution failed");
                return Err(AgentError::Drop(e.to_string()));
            }
        };
        if let Some(hook) = &self.events.on_drop {
            hook(&payload);
        }
        if files.is_empty() {
            return Ok(Vec::new());
        }
        if !config.has_multiple() {
            files.truncate(1);
        }
        self.handle_files(files).await
    }

    // -----------------------------------------------------------------------
    // Sorting
    // -----------------------------------------------------------------------

    pub fn set_sorting(&self, sorting: bool, active: bool) {
        let config = self.config();
        let count = self.records.lock().unwrap().len();
        let mut view = self.view.lock().unwrap();
        view.sorting = sorting;
        view.sorting_active = active;
        view.wrapper(&config, count)
            .paint(&mut *self.surface.lock().unwrap());
    }

    /// Moves a record to a new position.
    pub fn move_record(&self, from: usize, to: usize) -> Result<(), AgentError> {
        let config = self.config();
        if !config.is_sortable() {
            return Err(AgentError::NotSortable);
        }
        if !config.is_active() {
            return Err(AgentError::Inactive);
        }
        {
            let mut records = self.records.lock().unwrap();
            let len = records.len();
            if let Some(index) = [from, to].into_iter().find(|i| *i >= len) {
                return Err(AgentError::OutOfRange { index, len });
            }
            if from == to {
                return Ok(());
            }
            let record = records.remove(from);
            records.insert(to, record);
        }
        debug!(from, to, "record moved");
        self.fire_input();
        self.render();
        Ok(())
    }
}
