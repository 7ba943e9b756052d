//! Segment collection editor.
//!
//! Holds the working copy of the segments produced by the backend. Every
//! mutation that changes the collection ends with a full
//! [`Notification::SegmentsChanged`] snapshot so the embedding application can
//! replace its copy wholesale. Calls with unknown ids or unmet preconditions
//! are silent no-ops.

use std::collections::{BTreeSet, HashSet};

use pipeline_logging::{engine_debug, engine_info, engine_warn};

use crate::{
    ConfirmRequest, Effect, IncomingSegment, Notification, RunId, Segment, SegmentId,
    SegmentMetadata, SegmentationOptions, SegmentationPhase, SegmentationRequest,
};

/// Content given to segments created with "add segment".
pub const NEW_SEGMENT_PLACEHOLDER: &str = "";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentationRun {
    pub id: RunId,
    pub phase: SegmentationPhase,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EditorState {
    segments: Vec<Segment>,
    editing: Option<SegmentId>,
    selected: BTreeSet<SegmentId>,
    file_id: Option<String>,
    run: Option<SegmentationRun>,
    confirm_in_flight: bool,
    next_local_id: u64,
    next_run_id: RunId,
}

impl EditorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn editing(&self) -> Option<&SegmentId> {
        self.editing.as_ref()
    }

    pub fn selected(&self) -> &BTreeSet<SegmentId> {
        &self.selected
    }

    pub fn file_id(&self) -> Option<&str> {
        self.file_id.as_deref()
    }

    pub fn run(&self) -> Option<&SegmentationRun> {
        self.run.as_ref()
    }

    pub fn is_confirming(&self) -> bool {
        self.confirm_in_flight
    }

    /// Sum of character counts over the live collection.
    pub fn total_characters(&self) -> usize {
        self.segments.iter().map(Segment::char_count).sum()
    }

    fn position(&self, id: &SegmentId) -> Option<usize> {
        self.segments.iter().position(|segment| &segment.id == id)
    }

    fn snapshot(&self) -> Effect {
        Effect::Notify(Notification::SegmentsChanged(self.segments.clone()))
    }

    /// Returns a `local-N` id that is not used by the live collection.
    ///
    /// The counter only moves forward, so an id is never handed out twice.
    fn synthesize_id(&mut self, taken: &HashSet<SegmentId>) -> SegmentId {
        loop {
            self.next_local_id += 1;
            let candidate = SegmentId::new(format!("local-{}", self.next_local_id));
            if !taken.contains(&candidate) && self.position(&candidate).is_none() {
                return candidate;
            }
        }
    }

    pub(crate) fn replace_all(&mut self, segments: Vec<Segment>) -> Vec<Effect> {
        engine_info!("Replacing segment collection with {} segments", segments.len());
        self.segments = segments;
        self.editing = None;
        self.selected.clear();
        vec![self.snapshot()]
    }

    pub(crate) fn update_content(&mut self, id: &SegmentId, content: String) -> Vec<Effect> {
        let Some(index) = self.position(id) else {
            engine_debug!("Ignoring edit for unknown segment {}", id);
            return Vec::new();
        };
        if self.segments[index].content == content {
            return Vec::new();
        }
        self.segments[index].content = content;
        vec![self.snapshot()]
    }

    pub(crate) fn remove(&mut self, id: &SegmentId) -> Vec<Effect> {
        let Some(index) = self.position(id) else {
            engine_debug!("Ignoring removal of unknown segment {}", id);
            return Vec::new();
        };
        self.segments.remove(index);
        self.selected.remove(id);
        if self.editing.as_ref() == Some(id) {
            self.editing = None;
        }
        vec![self.snapshot()]
    }

    pub(crate) fn append(&mut self) -> Vec<Effect> {
        let id = self.synthesize_id(&HashSet::new());
        engine_debug!("Appending segment {}", id);
        self.segments.push(Segment {
            id: id.clone(),
            file_id: self.file_id.clone(),
            content: NEW_SEGMENT_PLACEHOLDER.to_string(),
            chunk_index: self.segments.len(),
            metadata: SegmentMetadata::default(),
        });
        self.editing = Some(id);
        vec![self.snapshot()]
    }

    pub(crate) fn merge(&mut self, ids: &[SegmentId]) -> Vec<Effect> {
        let wanted: HashSet<&SegmentId> = ids.iter().collect();
        let positions: Vec<usize> = self
            .segments
            .iter()
            .enumerate()
            .filter(|(_, segment)| wanted.contains(&segment.id))
            .map(|(index, _)| index)
            .collect();
        if positions.len() < 2 {
            engine_debug!("Merge needs two known segments, got {}", positions.len());
            return Vec::new();
        }

        let merged: String = positions
            .iter()
            .map(|&index| self.segments[index].content.as_str())
            .collect();
        let target = positions[0];
        self.segments[target].content = merged;

        let removed: HashSet<SegmentId> = positions[1..]
            .iter()
            .map(|&index| self.segments[index].id.clone())
            .collect();
        self.segments.retain(|segment| !removed.contains(&segment.id));
        self.selected.retain(|id| !removed.contains(id));
        if self
            .editing
            .as_ref()
            .is_some_and(|editing| removed.contains(editing))
        {
            self.editing = None;
        }
        engine_info!(
            "Merged {} segments into {}",
            positions.len(),
            self.segments[target].id
        );
        vec![self.snapshot()]
    }

    pub(crate) fn begin_edit(&mut self, id: SegmentId) -> bool {
        if self.position(&id).is_none() || self.editing.as_ref() == Some(&id) {
            return false;
        }
        self.editing = Some(id);
        true
    }

    pub(crate) fn finish_edit(&mut self) -> bool {
        self.editing.take().is_some()
    }

    pub(crate) fn toggle_selection(&mut self, id: SegmentId) -> bool {
        if self.position(&id).is_none() {
            return false;
        }
        if !self.selected.remove(&id) {
            self.selected.insert(id);
        }
        true
    }

    pub(crate) fn clear_selection(&mut self) -> bool {
        let had_any = !self.selected.is_empty();
        self.selected.clear();
        had_any
    }

    pub(crate) fn request_segmentation(
        &mut self,
        source_text: String,
        file_id: Option<String>,
        options: SegmentationOptions,
    ) -> Vec<Effect> {
        if self.run.is_some() {
            engine_debug!("Segmentation already running; request ignored");
            return Vec::new();
        }
        if source_text.trim().is_empty() {
            engine_debug!("Segmentation requested with empty text; ignored");
            return Vec::new();
        }

        self.next_run_id += 1;
        let run = self.next_run_id;
        if file_id.is_some() {
            self.file_id = file_id;
        }
        self.run = Some(SegmentationRun {
            id: run,
            phase: SegmentationPhase::Preparing,
        });
        engine_info!(
            "Segmentation run {} requested ({} chars, chunk_size {})",
            run,
            source_text.chars().count(),
            options.chunk_size
        );

        vec![
            Effect::Notify(Notification::SegmentationStarted),
            Effect::RequestSegmentation {
                run,
                request: SegmentationRequest {
                    content: source_text,
                    options,
                },
            },
        ]
    }

    pub(crate) fn segmentation_progress(&mut self, run: RunId, phase: SegmentationPhase) -> bool {
        match self.run.as_mut() {
            Some(active) if active.id == run && active.phase != phase => {
                active.phase = phase;
                true
            }
            _ => false,
        }
    }

    /// Applies a finished run. Accepting a response discards any local edits.
    pub(crate) fn segmentation_finished(
        &mut self,
        run: RunId,
        result: Result<Vec<IncomingSegment>, String>,
    ) -> Vec<Effect> {
        if self.run.as_ref().map(|active| active.id) != Some(run) {
            engine_debug!("Dropping result of superseded segmentation run {}", run);
            return Vec::new();
        }
        self.run = None;

        match result {
            Ok(incoming) => {
                let segments = self.materialize(incoming);
                let segment_count = segments.len();
                engine_info!("Segmentation run {} produced {} segments", run, segment_count);
                let mut effects = self.replace_all(segments);
                effects.push(Effect::Notify(Notification::SegmentationCompleted {
                    segment_count,
                }));
                effects
            }
            Err(error) => {
                engine_warn!("Segmentation run {} failed: {}", run, error);
                vec![Effect::Notify(Notification::SegmentationFailed { error })]
            }
        }
    }

    /// Turns backend segments into editor segments: ids are kept when present
    /// and unique within the batch, otherwise synthesized; `chunk_index` is the
    /// position in the response.
    fn materialize(&mut self, incoming: Vec<IncomingSegment>) -> Vec<Segment> {
        let mut taken: HashSet<SegmentId> = incoming
            .iter()
            .filter_map(|segment| segment.id.clone())
            .collect();
        let mut used: HashSet<SegmentId> = HashSet::with_capacity(incoming.len());
        let mut segments = Vec::with_capacity(incoming.len());

        for (chunk_index, segment) in incoming.into_iter().enumerate() {
            let id = match segment.id {
                Some(id) if !used.contains(&id) => id,
                _ => {
                    let id = self.synthesize_id(&taken);
                    taken.insert(id.clone());
                    id
                }
            };
            used.insert(id.clone());
            segments.push(Segment {
                id,
                file_id: self.file_id.clone(),
                content: segment.content,
                chunk_index,
                metadata: segment.metadata,
            });
        }
        segments
    }

    pub(crate) fn confirm(&mut self, source_text: String) -> Vec<Effect> {
        if self.confirm_in_flight || self.run.is_some() || self.segments.is_empty() {
            engine_debug!("Confirm not possible right now; ignored");
            return Vec::new();
        }
        self.confirm_in_flight = true;
        engine_info!("Confirming {} segments", self.segments.len());
        vec![Effect::ConfirmResults {
            request: ConfirmRequest {
                file_id: self.file_id.clone(),
                source_text,
                segments: self.segments.clone(),
            },
        }]
    }

    pub(crate) fn confirm_finished(&mut self, result: Result<String, String>) -> Vec<Effect> {
        if !self.confirm_in_flight {
            return Vec::new();
        }
        self.confirm_in_flight = false;
        let notification = match result {
            Ok(result_path) => {
                engine_info!("Results confirmed at {}", result_path);
                Notification::ResultsConfirmed { result_path }
            }
            Err(error) => {
                engine_warn!("Confirming results failed: {}", error);
                Notification::ConfirmFailed { error }
            }
        };
        vec![Effect::Notify(notification)]
    }
}
