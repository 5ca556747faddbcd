//! Topological, multi-pass execution of registered `CashFlowModel`s.

use std::collections::{HashMap, HashSet};

use performa_core::error::{PerformaError, PerformaResult};
use performa_ledger::{Ledger, TransactionMetadata};
use rayon::prelude::*;
use uuid::Uuid;

use crate::model::{CashFlowModel, Context};

/// Resolves `CashFlowModel` dependencies into passes and commits each
/// pass's output to the ledger as a single transaction before moving on.
#[derive(Default)]
pub struct Orchestrator {
    models: Vec<Box<dyn CashFlowModel>>,
}

impl Orchestrator {
    pub fn new() -> Self {
        Self { models: Vec::new() }
    }

    pub fn register(&mut self, model: Box<dyn CashFlowModel>) {
        self.models.push(model);
    }

    /// Run every registered model to completion, posting into `ledger`
    /// under `asset_id`. Aborts and propagates on the first pass failure;
    /// nothing from a failed pass is committed.
    pub fn run(&self, ledger: &mut Ledger, context: &mut Context, asset_id: Uuid) -> PerformaResult<()> {
        let passes = self.topological_passes()?;

        for (pass_idx, pass) in passes.into_iter().enumerate() {
            let pass_num = (pass_idx + 1) as u8;
            let mut pass_models: Vec<&Box<dyn CashFlowModel>> =
                pass.iter().map(|&idx| &self.models[idx]).collect();
            pass_models.sort_by_key(|m| m.id());

            tracing::info!(pass = pass_num, models = pass_models.len(), "executing orchestration pass");

            let (pure, impure): (Vec<_>, Vec<_>) =
                pass_models.into_iter().partition(|m| m.is_pure());

            let mut results: Vec<(String, PerformaResult<HashMap<String, _>>)> = pure
                .par_iter()
                .map(|m| (m.id(), m.compute_cf(context)))
                .collect();
            results.extend(impure.iter().map(|m| (m.id(), m.compute_cf(context))));
            results.sort_by(|a, b| a.0.cmp(&b.0));

            let all_models: Vec<&Box<dyn CashFlowModel>> = pure.into_iter().chain(impure).collect();

            ledger.transaction(|scope| {
                for (model_id, outputs) in &results {
                    let outputs = outputs.clone()?;
                    let model = all_models
                        .iter()
                        .find(|m| &m.id() == model_id)
                        .expect("model id present in results came from this pass");
                    let source_id = Uuid::new_v5(&Uuid::NAMESPACE_OID, model_id.as_bytes());

                    for spec in model.postings() {
                        if let Some(series) = outputs.get(&spec.output_name) {
                            tracing::debug!(model = %model_id, output = %spec.output_name, "posting model output");
                            let meta = TransactionMetadata {
                                category: spec.category,
                                subcategory: spec.subcategory,
                                item_name: spec.item_name.clone(),
                                source_id,
                                asset_id,
                                deal_id: None,
                                entity_id: spec.entity_id,
                                entity_type: spec.entity_type.clone(),
                                pass_num,
                            };
                            scope.append_series(series, &meta)?;
                        }
                    }
                }
                Ok(())
            })?;

            for (model_id, outputs) in results {
                context.record_outputs(model_id, outputs.expect("checked above"));
            }
        }

        Ok(())
    }

    fn topological_passes(&self) -> PerformaResult<Vec<Vec<usize>>> {
        let ids: Vec<String> = self.models.iter().map(|m| m.id()).collect();
        let mut remaining: HashSet<usize> = (0..self.models.len()).collect();
        let mut resolved: HashSet<usize> = HashSet::new();
        let mut passes = Vec::new();

        while !remaining.is_empty() {
            let mut pass: Vec<usize> = remaining
                .iter()
                .copied()
                .filter(|&idx| {
                    self.models[idx].dependencies().iter().all(|dep| {
                        ids.iter()
                            .position(|id| id == dep)
                            .map(|dep_idx| resolved.contains(&dep_idx))
                            .unwrap_or(false)
                    })
                })
                .collect();

            if pass.is_empty() {
                let mut cycle: Vec<String> = remaining.iter().map(|&idx| ids[idx].clone()).collect();
                cycle.sort();
                return Err(PerformaError::dependency_cycle(cycle));
            }

            pass.sort_unstable();
            for &idx in &pass {
                remaining.remove(&idx);
                resolved.insert(idx);
            }
            passes.push(pass);
        }

        Ok(passes)
    }
}
