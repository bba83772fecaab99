//! String similarity used to rank alternative package names

/// Similarity between two names in `[0, 1]`.
///
/// Sørensen–Dice coefficient over character bigrams, whitespace ignored.
/// Identical strings score 1; single-character strings only match themselves.
pub fn score(a: &str, b: &str) -> f64 {
    strsim::sorensen_dice(a, b)
}

/// Score every candidate against `query`, best first.
///
/// The sort is stable, so candidates with equal scores keep their input order.
pub fn best_matches<'a, I>(query: &str, candidates: I) -> Vec<(&'a str, f64)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut ratings: Vec<(&'a str, f64)> = candidates
        .into_iter()
        .map(|candidate| (candidate, score(query, candidate)))
        .collect();

    ratings.sort_by(|a, b| b.1.total_cmp(&a.1));
    ratings
}
