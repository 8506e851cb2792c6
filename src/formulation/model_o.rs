use super::{Conservation, Formulation, Scaffold, created};
use crate::error::FormulationError;
use crate::model::LinExpr;
use crate::types::VariantKind;

/// Baseline: prices cuts, waste and opened bars in one objective.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelO;

impl Formulation for ModelO {
    fn kind(&self) -> VariantKind {
        VariantKind::ModelO
    }

    fn conservation(&self) -> Conservation {
        Conservation::Exact
    }

    fn classify(&self, s: &mut Scaffold<'_>) -> Result<(), FormulationError> {
        let has_leftover = s.binaries("has_leftover");
        let reusable = s.binaries("reusable");
        let used = s.binaries("used");
        let w = s.params.waste_threshold;
        let m = s.big_m;

        for j in s.bars() {
            let waste = s.vars.waste[j];

            // has_leftover >= leftover / length, scaled by the bar length
            let c = (has_leftover[j] * s.length(j)).geq(s.leftover(j));
            s.add(format!("leftover_binary_{j}"), c);

            let c = (s.leftover(j) - waste).leq(reusable[j] * m);
            s.add(format!("waste_relation_1_{j}"), c);
            let c = (LinExpr::constant(w) - s.leftover(j))
                .leq(LinExpr::constant(m) - reusable[j] * m);
            s.add(format!("waste_relation_2_{j}"), c);

            // used >= count / M
            let c = (used[j] * m).geq(s.assigned_count(j));
            s.add(format!("object_usage_{j}"), c);
        }

        s.vars.reusable = Some(reusable);
        s.vars.used = Some(used);
        s.vars.leftover_flag = Some(has_leftover);
        Ok(())
    }

    fn objective(&self, s: &Scaffold<'_>) -> Result<LinExpr, FormulationError> {
        let p = s.params;
        let has_leftover = created(&s.vars.leftover_flag, self.kind(), "has_leftover")?;
        let used = created(&s.vars.used, self.kind(), "used")?;

        let cuts: LinExpr = s
            .bars()
            .map(|j| s.assigned_count(j) - 1.0 + has_leftover[j])
            .sum();
        let waste: LinExpr = s.vars.waste.iter().copied().sum();
        let opened: LinExpr = used.iter().copied().sum();

        Ok(cuts * p.cut_cost + waste * p.waste_unit_cost + opened)
    }
}
