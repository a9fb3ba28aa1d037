//! Plain-text rendering of command reports.

use std::io::{self, Write};

use ridings_core::{Identity, TransformPlan, Validity};
use ridings_data::{FeatureDiagnosis, ImportReport, MissingReport};

fn identity_line(identity: &Identity) -> String {
    if identity.source_code.is_empty() {
        identity.to_string()
    } else {
        format!("{identity} [{}]", identity.source_code)
    }
}

fn plan_line(plan: &TransformPlan) -> String {
    let mut line = if plan.needs_reprojection {
        format!("{} -> {}", plan.source_srid, plan.target_srid)
    } else {
        format!("{} (no reprojection)", plan.source_srid)
    };
    if plan.ambiguous {
        line.push_str(", extent disagrees with sampled coordinate");
    }
    line
}

pub(crate) fn write_import_report(writer: &mut dyn Write, report: &ImportReport) -> io::Result<()> {
    let summary = &report.summary;
    writeln!(writer, "Import summary")?;
    writeln!(writer, "  processed: {}", summary.processed)?;
    if summary.out_of_scope > 0 {
        writeln!(writer, "  out of scope: {}", summary.out_of_scope)?;
    }
    writeln!(writer, "  imported: {}", summary.imported)?;
    writeln!(writer, "  duplicates: {}", summary.duplicates)?;
    writeln!(writer, "  failed: {}", summary.failed)?;
    writeln!(writer, "  boundaries in store: {}", summary.total_in_store)?;

    if summary.failure_reasons.is_empty() {
        return Ok(());
    }
    writeln!(writer, "Failure reasons")?;
    for (category, count) in &summary.failure_reasons {
        writeln!(writer, "  {category}: {count}")?;
    }
    writeln!(writer, "Failed features")?;
    for failure in report.failures() {
        let reason = failure.outcome.failure_reason().unwrap_or_default();
        writeln!(
            writer,
            "  #{} {}: {reason}",
            failure.index,
            identity_line(&failure.identity)
        )?;
    }
    Ok(())
}

pub(crate) fn write_missing_report(writer: &mut dyn Write, report: &MissingReport) -> io::Result<()> {
    let reconciliation = &report.reconciliation;
    writeln!(
        writer,
        "Missing boundaries: {} of {} source features (store holds {})",
        reconciliation.missing.len(),
        reconciliation.total_features,
        report.stored_keys
    )?;
    for near in &report.near_matches {
        writeln!(writer, "  {}", identity_line(&near.identity))?;
        if near.candidates.is_empty() {
            writeln!(writer, "    no similar stored boundaries")?;
        }
        for candidate in &near.candidates {
            writeln!(
                writer,
                "    candidate #{} {}, {}",
                candidate.id, candidate.region_name, candidate.parent_region
            )?;
        }
    }

    if !reconciliation.duplicates_in_source.is_empty() {
        writeln!(writer, "Duplicated in source")?;
        for (key, count) in &reconciliation.duplicates_in_source {
            writeln!(writer, "  {key}: {count}")?;
        }
    }
    Ok(())
}

pub(crate) fn write_diagnoses(writer: &mut dyn Write, diagnoses: &[FeatureDiagnosis]) -> io::Result<()> {
    for entry in diagnoses {
        let diagnosis = &entry.diagnosis;
        writeln!(writer, "#{} {}", entry.index, identity_line(&entry.identity))?;
        writeln!(writer, "  type: {}", diagnosis.geometry_type)?;
        writeln!(writer, "  plan: {}", plan_line(&diagnosis.plan))?;
        if let Some(failure) = &diagnosis.preparation {
            writeln!(writer, "  preparation failed: {failure}")?;
        }
        for report in &diagnosis.strategies {
            match &report.validity {
                Validity::Valid => writeln!(writer, "  {}: valid", report.strategy)?,
                Validity::Invalid { reason } => {
                    writeln!(writer, "  {}: invalid ({reason})", report.strategy)?;
                }
            }
        }
    }
    let repairable = diagnoses.iter().filter(|entry| entry.repairable()).count();
    writeln!(
        writer,
        "Diagnosed {} features, {repairable} repairable",
        diagnoses.len()
    )
}
