use super::{Conservation, Formulation, Scaffold};
use crate::error::FormulationError;
use crate::model::LinExpr;
use crate::types::VariantKind;

/// Waste minimization without a leftover variable: what is not cut from a
/// used bar is either retail (at least the threshold) or waste.
#[derive(Debug, Clone, Copy, Default)]
pub struct Model2;

impl Formulation for Model2 {
    fn kind(&self) -> VariantKind {
        VariantKind::Model2
    }

    fn conservation(&self) -> Conservation {
        Conservation::Slack
    }

    fn classify(&self, s: &mut Scaffold<'_>) -> Result<(), FormulationError> {
        let cut_from = s.binaries("z");
        let retail = s.binaries("retail");
        let w = s.params.waste_threshold;
        let m = s.big_m;

        for j in s.bars() {
            // length * z - assigned
            let open_slack = cut_from[j] * s.length(j) - s.assigned_length(j);

            let c = (retail[j] * w).leq(open_slack.clone());
            s.add(format!("retail_min_length_{j}"), c);
            let c = (LinExpr::from(s.vars.waste[j]) + retail[j] * m).geq(open_slack);
            s.add(format!("waste_or_retail_{j}"), c);
            let c = LinExpr::from(retail[j]).leq(1.0);
            s.add(format!("retail_cap_{j}"), c);
        }

        s.vars.retail = Some(retail);
        Ok(())
    }

    fn objective(&self, s: &Scaffold<'_>) -> Result<LinExpr, FormulationError> {
        Ok(s.vars.waste.iter().copied().sum())
    }
}
