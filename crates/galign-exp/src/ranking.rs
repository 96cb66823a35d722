//! Competition ranking of score rows.

/// Ranks `row` so the highest score gets rank 1. Equal scores share the rank
/// of the first of them; the next lower score is ranked by the number of
/// entries ranked before it plus one (`[10, 10, 5]` gives `[1, 1, 3]`).
pub fn scores_to_rankings(row: &[f64]) -> Vec<usize> {
    let wrapped: Vec<Option<f64>> = row.iter().copied().map(Some).collect();
    rank_row(&wrapped)
        .into_iter()
        .map(|rank| rank.unwrap_or(0))
        .collect()
}

/// Competition ranks over the resolved entries of `row`; unresolved entries
/// stay unresolved and do not take a rank.
pub fn rank_row(row: &[Option<f64>]) -> Vec<Option<usize>> {
    let mut order: Vec<(usize, f64)> = row
        .iter()
        .enumerate()
        .filter_map(|(idx, score)| score.map(|score| (idx, score)))
        .collect();
    order.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut ranks = vec![None; row.len()];
    let mut previous: Option<(f64, usize)> = None;
    for (position, (idx, score)) in order.into_iter().enumerate() {
        let rank = match previous {
            Some((prev_score, prev_rank)) if prev_score == score => prev_rank,
            _ => position + 1,
        };
        ranks[idx] = Some(rank);
        previous = Some((score, rank));
    }
    ranks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ties_share_first_rank() {
        assert_eq!(scores_to_rankings(&[10.0, 10.0, 5.0]), vec![1, 1, 3]);
    }

    #[test]
    fn strictly_decreasing_row() {
        assert_eq!(scores_to_rankings(&[3.0, 2.0, 1.0]), vec![1, 2, 3]);
    }

    #[test]
    fn order_of_input_is_kept() {
        assert_eq!(scores_to_rankings(&[0.2, 0.9, 0.5, 0.9]), vec![4, 1, 3, 1]);
    }

    #[test]
    fn unresolved_entries_are_skipped() {
        let ranks = rank_row(&[Some(0.4), None, Some(0.7)]);
        assert_eq!(ranks, vec![Some(2), None, Some(1)]);
    }

    #[test]
    fn empty_row() {
        assert!(scores_to_rankings(&[]).is_empty());
    }
}
