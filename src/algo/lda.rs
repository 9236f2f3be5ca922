use crate::algo::rng::LcgRng;
use crate::algo::vectorize::DocTermMatrix;

/// Fitted latent topic model.
///
/// Estimated from term co-occurrence by batch variational-EM updates:
/// each document is a mixture over `n_topics` topics, each topic a
/// distribution over vocabulary terms.
#[derive(Debug, Clone)]
pub struct TopicModel {
    /// Topic-term weights (`n_topics` × `n_terms`); rows normalized.
    pub topic_term: Vec<Vec<f64>>,
    /// Document-topic weights (`n_docs` × `n_topics`); each row is a
    /// probability distribution.
    pub doc_topic: Vec<Vec<f64>>,
    pub n_topics: usize,
}

impl TopicModel {
    /// Top `n` vocabulary terms for one topic by descending weight.
    /// Equal weights resolve toward the lower vocabulary index.
    pub fn top_terms(&self, topic: usize, n: usize, vocabulary: &[String]) -> Vec<(String, f64)> {
        if topic >= self.n_topics {
            return vec![];
        }
        let row = &self.topic_term[topic];
        let mut indexed: Vec<(usize, f64)> = row.iter().copied().enumerate().collect();
        indexed.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        indexed
            .into_iter()
            .take(n)
            .map(|(i, w)| (vocabulary[i].clone(), w))
            .collect()
    }

    /// Dominant topic per document: argmax of the document's topic weights,
    /// lowest topic index on ties.
    pub fn dominant_topics(&self) -> Vec<usize> {
        self.doc_topic
            .iter()
            .map(|row| {
                let mut best = 0;
                for (k, &w) in row.iter().enumerate() {
                    if w > row[best] {
                        best = k;
                    }
                }
                best
            })
            .collect()
    }
}

/// Fit the topic model to a document-term matrix.
///
/// Initialization is uniform plus small seeded noise, so identical input
/// and seed always reproduce the same topics. `matrix` must be
/// non-degenerate (at least one term); the vectorizer rejects empty
/// vocabularies upstream.
pub fn fit(matrix: &DocTermMatrix, n_topics: usize, max_iter: usize, seed: u64) -> TopicModel {
    let n_docs = matrix.n_docs();
    let n_terms = matrix.n_terms();

    let mut rng = LcgRng::new(seed);
    let mut doc_topic: Vec<Vec<f64>> = (0..n_docs)
        .map(|_| {
            (0..n_topics)
                .map(|_| 1.0 / n_topics as f64 + rng.next_f64() * 0.01)
                .collect()
        })
        .collect();
    let mut topic_term: Vec<Vec<f64>> = (0..n_topics)
        .map(|_| {
            (0..n_terms)
                .map(|_| 1.0 / n_terms as f64 + rng.next_f64() * 0.01)
                .collect()
        })
        .collect();
    normalize_rows(&mut doc_topic, n_topics);
    normalize_rows(&mut topic_term, n_terms);

    let mut responsibilities = vec![0.0f64; n_topics];

    for _ in 0..max_iter {
        let mut new_doc_topic = vec![vec![0.0f64; n_topics]; n_docs];
        let mut new_topic_term = vec![vec![0.0f64; n_terms]; n_topics];

        // E-step: distribute each (document, term) count over topics by
        // the current estimate of p(topic | document, term).
        for (d, row) in matrix.rows.iter().enumerate() {
            for &(v, count) in row {
                let mut sum = 0.0;
                for k in 0..n_topics {
                    responsibilities[k] = doc_topic[d][k] * topic_term[k][v];
                    sum += responsibilities[k];
                }
                if sum <= 1e-12 {
                    continue;
                }
                for k in 0..n_topics {
                    let share = count * responsibilities[k] / sum;
                    new_doc_topic[d][k] += share;
                    new_topic_term[k][v] += share;
                }
            }
        }

        // M-step
        normalize_rows(&mut new_doc_topic, n_topics);
        normalize_rows(&mut new_topic_term, n_terms);
        doc_topic = new_doc_topic;
        topic_term = new_topic_term;
    }

    TopicModel {
        topic_term,
        doc_topic,
        n_topics,
    }
}

/// Normalize each row to sum to 1; all-zero rows become uniform so a
/// zero-information document still carries a valid distribution.
fn normalize_rows(rows: &mut [Vec<f64>], width: usize) {
    for row in rows {
        let sum: f64 = row.iter().sum();
        if sum <= 1e-12 {
            row.iter_mut().for_each(|w| *w = 1.0 / width as f64);
        } else {
            row.iter_mut().for_each(|w| *w /= sum);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::vectorize::{vectorize, VectorizeConfig};

    fn matrix(texts: &[&str]) -> DocTermMatrix {
        let docs: Vec<String> = texts.iter().map(|t| t.to_string()).collect();
        let cfg = VectorizeConfig {
            min_doc_freq: 2,
            max_doc_freq_ratio: 1.0,
            ..Default::default()
        };
        vectorize(&docs, &cfg).unwrap()
    }

    #[test]
    fn fit_shapes() {
        let m = matrix(&["battery battery life", "battery life good", "screen bright", "screen clear bright"]);
        let model = fit(&m, 2, 20, 42);
        assert_eq!(model.doc_topic.len(), 4);
        assert_eq!(model.topic_term.len(), 2);
        assert!(model.topic_term.iter().all(|row| row.len() == m.n_terms()));
    }

    #[test]
    fn doc_rows_are_distributions() {
        let m = matrix(&["battery battery life", "battery life", "screen bright", "screen bright clear"]);
        let model = fit(&m, 2, 20, 42);
        for row in &model.doc_topic {
            let sum: f64 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-9, "row sums to {sum}");
            assert!(row.iter().all(|&w| w >= 0.0));
        }
    }

    #[test]
    fn same_seed_reproduces_model() {
        let m = matrix(&["battery battery life", "battery life", "screen bright", "screen bright"]);
        let a = fit(&m, 2, 20, 42);
        let b = fit(&m, 2, 20, 42);
        assert_eq!(a.doc_topic, b.doc_topic);
        assert_eq!(a.topic_term, b.topic_term);
    }

    #[test]
    fn disjoint_groups_share_dominant_topic() {
        let m = matrix(&[
            "battery battery battery life life",
            "battery battery life life life",
            "screen screen screen bright bright",
            "screen screen bright bright bright",
        ]);
        let model = fit(&m, 2, 50, 42);
        let dominant = model.dominant_topics();
        assert_eq!(dominant[0], dominant[1], "battery docs should share a topic");
        assert_eq!(dominant[2], dominant[3], "screen docs should share a topic");
    }

    #[test]
    fn dominant_ties_pick_lowest_index() {
        let model = TopicModel {
            topic_term: vec![vec![0.5, 0.5], vec![0.5, 0.5]],
            doc_topic: vec![vec![0.5, 0.5]],
            n_topics: 2,
        };
        assert_eq!(model.dominant_topics(), vec![0]);
    }

    #[test]
    fn top_terms_sorted_with_index_tiebreak() {
        let model = TopicModel {
            topic_term: vec![vec![0.2, 0.4, 0.2, 0.2]],
            doc_topic: vec![],
            n_topics: 1,
        };
        let vocab: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        let top = model.top_terms(0, 3, &vocab);
        assert_eq!(top[0].0, "b");
        // Remaining 0.2-weight ties resolve by vocabulary order
        assert_eq!(top[1].0, "a");
        assert_eq!(top[2].0, "c");
    }

    #[test]
    fn top_terms_out_of_range_topic() {
        let model = TopicModel {
            topic_term: vec![vec![1.0]],
            doc_topic: vec![],
            n_topics: 1,
        };
        assert!(model.top_terms(5, 3, &["x".to_string()]).is_empty());
    }
}
