//! Oncogene/tumour suppressor role of panel genes.

use crate::error::Error;

/// Resolved role of a driver gene, written as Hartwig `likelihoodType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
pub enum GeneRole {
    #[strum(serialize = "ONCO")]
    Oncogene,
    #[strum(serialize = "TSG")]
    TumorSuppressor,
}

/// Interpret a panel role flag column.
fn parse_flag(gene: &str, value: Option<&str>) -> Result<bool, Error> {
    match value.unwrap_or_default() {
        "TRUE" => Ok(true),
        "FALSE" | "NA" | "" => Ok(false),
        other => Err(Error::UnknownRole {
            gene: gene.to_string(),
            role: other.to_string(),
        }),
    }
}

/// Resolve the role of `gene` from its panel flags and the reference likelihood type.
///
/// A single set flag wins.  Genes with neither or both flags take the role from
/// `reference`, defaulting to tumour suppressor for genes without a reference entry.
pub fn resolve_role(
    gene: &str,
    oncogene: Option<&str>,
    tsgene: Option<&str>,
    reference: Option<&str>,
) -> Result<GeneRole, Error> {
    match (parse_flag(gene, oncogene)?, parse_flag(gene, tsgene)?) {
        (true, false) => Ok(GeneRole::Oncogene),
        (false, true) => Ok(GeneRole::TumorSuppressor),
        _ => match reference {
            None => Ok(GeneRole::TumorSuppressor),
            Some(likelihood) => likelihood.parse().map_err(|_| Error::UnknownRole {
                gene: gene.to_string(),
                role: likelihood.to_string(),
            }),
        },
    }
}

/// Driver gene panel row: all somatic reporting on, any germline reporting.
pub fn driver_gene_row(gene: &str, role: GeneRole) -> Vec<String> {
    std::iter::once(gene.to_string())
        .chain(std::iter::repeat("true".to_string()).take(7))
        .chain(std::iter::once(role.to_string()))
        .chain(std::iter::repeat("ANY".to_string()).take(4))
        .chain([String::new(), "false".to_string()])
        .collect()
}
