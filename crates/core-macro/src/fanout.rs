//! Distribution of recorded per-cursor data onto a live cursor set.

/// Map data captured at `recorded.len()` cursors onto `live` cursors.
///
/// Extra live cursors reuse the last datum. When there are fewer live
/// cursors, the surplus data is concatenated onto the last live cursor's
/// datum so nothing is lost.
pub fn distribute(recorded: &[String], live: usize) -> Vec<String> {
    if live == 0 {
        return Vec::new();
    }
    let Some(last) = recorded.last() else {
        return vec![String::new(); live];
    };
    if recorded.len() <= live {
        let mut out = recorded.to_vec();
        out.resize(live, last.clone());
        return out;
    }
    let mut out = recorded[..live].to_vec();
    if let Some(tail) = out.last_mut() {
        for extra in &recorded[live..] {
            tail.push_str(extra);
        }
    }
    out
}
