//! 多明細單據分配（發藥單/調撥單）

use chrono::NaiveDate;
use fefo_core::{AllocationRequest, AllocationResult, Batch};
use rayon::prelude::*;
use std::collections::BTreeMap;

use crate::FefoAllocator;

/// 單據分配器
///
/// 同一物料、庫位的多筆明細共用同一份快照並依序扣減，不會重複分配同一批次；
/// 不同物料、庫位的明細平行計算。
pub struct DocumentPlanner<'a> {
    allocator: &'a FefoAllocator,
}

impl<'a> DocumentPlanner<'a> {
    /// 創建新的單據分配器
    pub fn new(allocator: &'a FefoAllocator) -> Self {
        Self { allocator }
    }

    /// 為整張單據的每筆明細產生分配結果
    ///
    /// # 參數
    /// * `lines` - 單據明細（依單據順序）
    /// * `snapshot` - 涵蓋所有明細物料與庫位的批次快照
    /// * `as_of` - 判斷過期的基準日
    ///
    /// 回傳結果與 `lines` 順序一致；任一明細失敗時回傳順序最前的錯誤。
    pub fn plan(
        &self,
        lines: &[AllocationRequest],
        snapshot: &[Batch],
        as_of: NaiveDate,
    ) -> fefo_core::Result<Vec<AllocationResult>> {
        tracing::info!(
            "開始單據 FEFO 分配：明細 {} 筆，快照批次 {} 筆",
            lines.len(),
            snapshot.len()
        );

        for line in lines {
            line.validate()?;
        }

        // 按物料、庫位分組（BTreeMap 保證分組順序固定）
        let mut groups: BTreeMap<(&str, &str), Vec<usize>> = BTreeMap::new();
        for (index, line) in lines.iter().enumerate() {
            groups.entry(line.stock_key()).or_default().push(index);
        }
        tracing::debug!("分組數量: {}", groups.len());

        let planned: Vec<Vec<(usize, fefo_core::Result<AllocationResult>)>> = groups
            .into_par_iter()
            .map(|((item_id, location_id), indices)| {
                self.plan_group(item_id, location_id, &indices, lines, snapshot, as_of)
            })
            .collect();

        let mut slots: Vec<Option<fefo_core::Result<AllocationResult>>> =
            (0..lines.len()).map(|_| None).collect();
        for (index, result) in planned.into_iter().flatten() {
            slots[index] = Some(result);
        }

        let results = slots
            .into_iter()
            .flatten()
            .collect::<fefo_core::Result<Vec<_>>>()?;

        tracing::info!("單據 FEFO 分配完成");
        Ok(results)
    }

    /// 計算單一物料、庫位的所有明細
    fn plan_group(
        &self,
        item_id: &str,
        location_id: &str,
        indices: &[usize],
        lines: &[AllocationRequest],
        snapshot: &[Batch],
        as_of: NaiveDate,
    ) -> Vec<(usize, fefo_core::Result<AllocationResult>)> {
        let mut working: Vec<Batch> = snapshot
            .iter()
            .filter(|b| b.belongs_to(item_id, location_id))
            .cloned()
            .collect();

        let mut outcomes = Vec::with_capacity(indices.len());
        for &index in indices {
            let outcome = self
                .allocator
                .plan_allocation(&working, lines[index].requested_qty, as_of);

            let failed = outcome.is_err();
            if let Ok(result) = &outcome {
                Self::consume(&mut working, result);
            }
            outcomes.push((index, outcome));

            // 快照本身不合法，後續明細不再計算
            if failed {
                break;
            }
        }
        outcomes
    }

    /// 從工作快照扣除已分配數量
    fn consume(working: &mut [Batch], result: &AllocationResult) {
        for line in &result.plan {
            if let Some(batch) = working.iter_mut().find(|b| b.batch_id == line.batch_id) {
                batch.on_hand_qty -= line.quantity;
            }
        }
    }
}
