/// Resolve a requested parameter against data-derived ceilings.
///
/// Returns `max(floor, min(requested, ceilings...))`. Every adaptive
/// parameter in the pipeline (topic count, embedding perplexity) goes
/// through this one clamp so the rule is defined and tested once.
///
/// The floor wins over the ceilings: on degenerate inputs where a ceiling
/// drops below the floor, the floor is still returned.
pub fn effective_param(requested: usize, floor: usize, ceilings: &[usize]) -> usize {
    let capped = ceilings
        .iter()
        .fold(requested, |acc, &ceiling| acc.min(ceiling));
    capped.max(floor)
}
