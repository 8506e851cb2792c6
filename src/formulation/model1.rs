use super::{Conservation, Formulation, Scaffold};
use crate::error::FormulationError;
use crate::model::LinExpr;
use crate::types::VariantKind;

/// Minimizes waste length, classifying each used bar's leftover as either
/// waste or retail returned to stock.
#[derive(Debug, Clone, Copy, Default)]
pub struct Model1;

impl Formulation for Model1 {
    fn kind(&self) -> VariantKind {
        VariantKind::Model1
    }

    fn conservation(&self) -> Conservation {
        Conservation::Exact
    }

    fn classify(&self, s: &mut Scaffold<'_>) -> Result<(), FormulationError> {
        let cut_from = s.binaries("z");
        let reusable = s.binaries("reusable");
        let retail = s.binaries("retail");
        let w = s.params.waste_threshold;
        let eps = s.params.epsilon;
        let m = s.big_m;

        for j in s.bars() {
            let waste = s.vars.waste[j];
            let z = cut_from[j];
            let yr = reusable[j];
            let ylr = retail[j];
            // M * (1 - reusable)
            let not_reusable_m = LinExpr::constant(m) - yr * m;

            let c = LinExpr::from(z).leq(s.assigned_count(j));
            s.add(format!("used_if_cut_{j}"), c);
            let c = (z * m).geq(s.assigned_count(j));
            s.add(format!("cut_if_used_{j}"), c);

            // reusable only when leftover - W >= eps
            let c = (s.leftover(j) - w).geq(-not_reusable_m.clone() + eps);
            s.add(format!("reusable_floor_{j}"), c);
            let c = (s.leftover(j) - w).leq(yr * m);
            s.add(format!("reusable_ceiling_{j}"), c);

            let c = LinExpr::from(waste).leq(not_reusable_m.clone());
            s.add(format!("waste_if_not_reusable_{j}"), c);
            let c = LinExpr::from(waste).leq(z * m);
            s.add(format!("waste_if_used_{j}"), c);
            let c = LinExpr::from(waste).leq(s.leftover(j));
            s.add(format!("waste_within_leftover_{j}"), c);
            let c = (s.leftover(j) - waste + not_reusable_m + z * m).leq(2.0 * m);
            s.add(format!("waste_is_leftover_{j}"), c);

            let c = LinExpr::from(ylr).leq(z);
            s.add(format!("retail_if_used_{j}"), c);
            // (1 - reusable) + retail <= 1
            let c = (LinExpr::constant(1.0) - yr + ylr).leq(1.0);
            s.add(format!("waste_or_retail_{j}"), c);
            // z <= (1 - reusable) + retail
            let c = (LinExpr::from(z) - 1.0 + yr - ylr).leq(0.0);
            s.add(format!("used_is_classified_{j}"), c);
            let c = LinExpr::from(ylr).leq(1.0);
            s.add(format!("retail_cap_{j}"), c);
        }

        s.vars.reusable = Some(reusable);
        s.vars.retail = Some(retail);
        Ok(())
    }

    fn objective(&self, s: &Scaffold<'_>) -> Result<LinExpr, FormulationError> {
        Ok(s.vars.waste.iter().copied().sum())
    }
}
