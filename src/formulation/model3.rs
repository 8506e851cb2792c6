use super::{Conservation, Formulation, Scaffold, created};
use crate::error::FormulationError;
use crate::model::LinExpr;
use crate::types::VariantKind;

/// Prices waste and retail leftovers directly; unused bars keep their full
/// length out of the model through the usage flag.
#[derive(Debug, Clone, Copy, Default)]
pub struct Model3;

impl Formulation for Model3 {
    fn kind(&self) -> VariantKind {
        VariantKind::Model3
    }

    fn conservation(&self) -> Conservation {
        Conservation::UsageScaled
    }

    fn classify(&self, s: &mut Scaffold<'_>) -> Result<(), FormulationError> {
        // created by the usage-scaled conservation rows
        let used = created(&s.vars.used, self.kind(), "used")?.to_vec();
        let retail = s.binaries("retail");
        let w = s.params.waste_threshold;
        let longest = s.instance.max_bar() as f64;

        for j in s.bars() {
            // W - leftover + W * (retail - 1) <= 0
            let c = (LinExpr::constant(w) - s.leftover(j) + retail[j] * w - w).leq(0.0);
            s.add(format!("retail_min_length_{j}"), c);

            // leftover - waste <= (retail + 1 - used) * longest
            let slack = (LinExpr::from(retail[j]) + 1.0 - used[j]) * longest;
            let c = (s.leftover(j) - s.vars.waste[j]).leq(slack);
            s.add(format!("waste_or_retail_{j}"), c);
        }

        s.vars.retail = Some(retail);
        Ok(())
    }

    fn objective(&self, s: &Scaffold<'_>) -> Result<LinExpr, FormulationError> {
        let p = s.params;
        let retail = created(&s.vars.retail, self.kind(), "retail")?;
        let waste: LinExpr = s.vars.waste.iter().copied().sum();
        let retained: LinExpr = retail.iter().copied().sum();
        Ok(waste * p.waste_unit_cost + retained * p.retail_cost)
    }
}
