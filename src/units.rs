pub mod carbon;
pub mod energy;
pub mod mass;
pub mod quantity;
pub mod specific;

pub use self::{
    carbon::{GramsCo2, GramsPerMegajoule, MegajoulesPerKilogram},
    energy::MegawattHours,
    mass::{TonnesAmmonia, TonnesHydrogen},
    quantity::Quantity,
    specific::{MwhPerTonneAmmonia, MwhPerTonneHydrogen, TonnesHydrogenPerTonneAmmonia},
};
