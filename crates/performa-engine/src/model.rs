//! The uniform leaf `CashFlowModel` contract and the read-only `Context` it
//! is evaluated against.

use std::collections::HashMap;

use performa_core::error::PerformaResult;
use performa_core::series::CashFlowSeries;
use performa_core::timeline::Timeline;
use performa_ledger::{Category, Subcategory};
use performa_types::{Deal, Settings};
use uuid::Uuid;

/// Shared-immutable state visible to every model in the pass currently
/// executing. A model reads its own inputs, the outputs of earlier passes
/// (via [`Context::output`]), and the timeline/settings — never the
/// ledger of its own pass.
pub struct Context<'a> {
    pub timeline: &'a Timeline,
    pub settings: &'a Settings,
    pub deal: &'a Deal,
    outputs: HashMap<String, HashMap<String, CashFlowSeries>>,
}

impl<'a> Context<'a> {
    pub fn new(timeline: &'a Timeline, settings: &'a Settings, deal: &'a Deal) -> Self {
        Self {
            timeline,
            settings,
            deal,
            outputs: HashMap::new(),
        }
    }

    /// A named output produced by `model_id` in an earlier, already-committed
    /// pass.
    pub fn output(&self, model_id: &str, name: &str) -> Option<&CashFlowSeries> {
        self.outputs.get(model_id).and_then(|m| m.get(name))
    }

    /// Record a model's outputs after its owning pass commits, making them
    /// visible to subsequent passes.
    pub(crate) fn record_outputs(&mut self, model_id: String, outputs: HashMap<String, CashFlowSeries>) {
        self.outputs.insert(model_id, outputs);
    }
}

/// Static declaration of how one named output of a model's `compute_cf`
/// becomes ledger records. The orchestrator, not the model, owns this
/// decision's execution — the model only declares it.
#[derive(Debug, Clone)]
pub struct PostingSpec {
    pub output_name: String,
    pub category: Category,
    pub subcategory: Subcategory,
    pub item_name: String,
    pub entity_id: Option<Uuid>,
    pub entity_type: Option<String>,
}

impl PostingSpec {
    pub fn new(
        output_name: impl Into<String>,
        category: Category,
        subcategory: Subcategory,
        item_name: impl Into<String>,
    ) -> Self {
        Self {
            output_name: output_name.into(),
            category,
            subcategory,
            item_name: item_name.into(),
            entity_id: None,
            entity_type: None,
        }
    }

    pub fn with_entity(mut self, entity_id: Uuid, entity_type: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id);
        self.entity_type = Some(entity_type.into());
        self
    }
}

/// A leaf computation that, given a [`Context`], produces a mapping
/// `name -> CashFlowSeries` over the active timeline.
pub trait CashFlowModel: Send + Sync {
    /// Stable identifier, unique within one orchestration run. Used for
    /// dependency resolution, deterministic execution order, and as the
    /// key under which this model's outputs become visible to later passes.
    fn id(&self) -> String;

    /// Other models (by identity) whose outputs this model needs. Cycles
    /// are errors.
    fn dependencies(&self) -> Vec<String> {
        Vec::new()
    }

    /// Whether this model may be executed in parallel with others in the
    /// same pass. A `true` model must not mutate any state outside what it
    /// returns.
    fn is_pure(&self) -> bool {
        true
    }

    /// Declares which named outputs become ledger records, and with what
    /// category/subcategory/item metadata.
    fn postings(&self) -> Vec<PostingSpec>;

    /// Compute this model's named outputs for the active timeline.
    fn compute_cf(&self, context: &Context) -> PerformaResult<HashMap<String, CashFlowSeries>>;
}
