//! Wholesaler roster joins producing the unified UIT table.

use super::PipelineError;
use crate::data::normalize::drop_right_duplicates;
use crate::data::schema::columns;
use polars::prelude::*;

fn require(df: &DataFrame, cols: &[&str]) -> Result<(), PipelineError> {
    for name in cols {
        if !df.schema().contains(name) {
            return Err(PipelineError::MissingColumn((*name).to_string()));
        }
    }
    Ok(())
}

/// Left join that keeps the left side's row order.
fn left_join_args() -> JoinArgs {
    let mut args = JoinArgs::new(JoinType::Left);
    args.maintain_order = MaintainOrderJoin::Left;
    args
}

/// Build the unified UIT table: every UIT sales record, annotated with the
/// wholesalers responsible for its zip code.
///
/// Step 1 merges the two rosters on State (ft roster is the base side);
/// step 2 merges the UIT master onto the combined roster by Zip. Both are
/// left joins, so every UIT row survives even without a roster match — those
/// rows carry null wholesaler fields. When City/State exist on both sides,
/// the sales record's own values win and keep the unqualified names.
///
/// Known sharp edge: Zip is not guaranteed unique on the roster side. A zip
/// matching multiple roster rows fans out into multiple result rows, exactly
/// as the source systems produce it. Do not deduplicate here — downstream
/// consumers expect the fan-out.
pub fn build_unified_uit(
    uit: &DataFrame,
    ft_roster: &DataFrame,
    vest_roster: &DataFrame,
) -> Result<DataFrame, PipelineError> {
    require(uit, &[columns::ZIP])?;
    require(ft_roster, &[columns::STATE, columns::ZIP])?;
    require(vest_roster, &[columns::STATE])?;

    let roster = ft_roster
        .clone()
        .lazy()
        .join(
            vest_roster.clone().lazy(),
            [col(columns::STATE)],
            [col(columns::STATE)],
            left_join_args(),
        )
        .collect()?;

    let unified = uit
        .clone()
        .lazy()
        .join(
            roster.lazy(),
            [col(columns::ZIP)],
            [col(columns::ZIP)],
            left_join_args(),
        )
        .collect()?;

    Ok(drop_right_duplicates(unified))
}
