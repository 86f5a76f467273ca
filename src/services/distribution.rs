use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct TopicWeight {
    pub id: Uuid,
    pub name: String,
    pub weightage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicDistribution {
    pub topic_id: Uuid,
    pub topic_name: String,
    pub weightage: f64,
    pub questions_to_generate: i64,
}

/// Splits `total_questions` across topics proportionally to their weightage.
///
/// Every topic receives at least one question, even with zero recorded
/// weightage. Whatever the per-topic rounding leaves over (positive or
/// negative) is applied in one step to the single highest-weightage topic;
/// with a large enough shortfall that topic's quota can go below zero. The
/// returned list keeps the input order.
pub fn calculate_question_distribution(
    topics: &[TopicWeight],
    total_questions: i64,
) -> Vec<TopicDistribution> {
    let total_weightage: f64 = topics.iter().map(|t| t.weightage).sum();

    let mut distribution: Vec<TopicDistribution> = Vec::with_capacity(topics.len());
    let mut assigned_questions: i64 = 0;

    for topic in topics {
        let questions_for_topic = if topic.weightage == 0.0 {
            1
        } else if total_weightage == 0.0 {
            (total_questions as f64 / topics.len() as f64).ceil() as i64
        } else {
            let calculated = (topic.weightage / total_weightage) * total_questions as f64;
            let rounded = calculated.round() as i64;
            if rounded == 0 && topic.weightage > 0.0 {
                1
            } else {
                rounded
            }
        };

        distribution.push(TopicDistribution {
            topic_id: topic.id,
            topic_name: topic.name.clone(),
            weightage: topic.weightage,
            questions_to_generate: questions_for_topic,
        });

        assigned_questions += questions_for_topic;
    }

    let difference = total_questions - assigned_questions;
    if difference != 0 && !distribution.is_empty() {
        // Stable sort over indices: ties between equal weightages resolve to
        // the earliest topic in input order.
        let mut order: Vec<usize> = (0..distribution.len()).collect();
        order.sort_by(|&a, &b| {
            distribution[b]
                .weightage
                .partial_cmp(&distribution[a].weightage)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        distribution[order[0]].questions_to_generate += difference;
    }

    distribution
}

pub fn total_questions_from_distribution(distribution: &[TopicDistribution]) -> i64 {
    distribution.iter().map(|d| d.questions_to_generate).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic(name: &str, weightage: f64) -> TopicWeight {
        TopicWeight {
            id: Uuid::new_v4(),
            name: name.to_string(),
            weightage,
        }
    }

    fn quotas(distribution: &[TopicDistribution]) -> Vec<i64> {
        distribution.iter().map(|d| d.questions_to_generate).collect()
    }

    #[test]
    fn proportional_split_without_remainder() {
        let topics = vec![topic("A", 50.0), topic("B", 30.0), topic("C", 20.0)];
        let distribution = calculate_question_distribution(&topics, 10);
        assert_eq!(quotas(&distribution), vec![5, 3, 2]);
        assert_eq!(total_questions_from_distribution(&distribution), 10);
    }

    #[test]
    fn all_zero_weightage_topics_get_floor_then_remainder_goes_to_first() {
        let topics = vec![topic("A", 0.0), topic("B", 0.0)];
        let distribution = calculate_question_distribution(&topics, 5);
        // Both take the zero-weightage floor of 1; the remainder of 3 lands
        // on A because the stable tie-break keeps input order.
        assert_eq!(quotas(&distribution), vec![4, 1]);
        assert_eq!(total_questions_from_distribution(&distribution), 5);
    }

    #[test]
    fn tiny_positive_weightage_is_never_dropped() {
        let topics = vec![topic("rare", 1.0), topic("dominant", 1000.0)];
        let distribution = calculate_question_distribution(&topics, 10);
        // 1/1001 of 10 rounds to 0 and is forced up to 1; the correction
        // takes the overshoot back out of the dominant topic.
        assert_eq!(quotas(&distribution), vec![1, 9]);
        assert_eq!(total_questions_from_distribution(&distribution), 10);
    }

    #[test]
    fn remainder_lands_on_highest_weightage_topic() {
        let topics = vec![topic("A", 10.0), topic("B", 70.0), topic("C", 20.0)];
        let distribution = calculate_question_distribution(&topics, 7);
        // raw: round(0.7)=1, round(4.9)=5, round(1.4)=1 => 7 assigned, no diff
        assert_eq!(total_questions_from_distribution(&distribution), 7);

        let distribution = calculate_question_distribution(&topics, 11);
        // raw: round(1.1)=1, round(7.7)=8, round(2.2)=2 => 11, exact again
        assert_eq!(quotas(&distribution), vec![1, 8, 2]);

        let distribution = calculate_question_distribution(&topics, 12);
        // raw: round(1.2)=1, round(8.4)=8, round(2.4)=2 => 11, diff 1 -> B
        assert_eq!(quotas(&distribution), vec![1, 9, 2]);
    }

    #[test]
    fn sum_matches_requested_total_for_mixed_inputs() {
        let cases: Vec<(Vec<TopicWeight>, i64)> = vec![
            (vec![topic("A", 33.0), topic("B", 33.0), topic("C", 34.0)], 100),
            (vec![topic("A", 1.0)], 1),
            (vec![topic("A", 0.0), topic("B", 60.0), topic("C", 40.0)], 25),
            (
                vec![topic("A", 12.5), topic("B", 37.5), topic("C", 25.0), topic("D", 25.0)],
                17,
            ),
        ];

        for (topics, total) in cases {
            let distribution = calculate_question_distribution(&topics, total);
            assert_eq!(
                total_questions_from_distribution(&distribution),
                total,
                "sum invariant violated for total={}",
                total
            );
        }
    }

    #[test]
    fn every_topic_receives_at_least_one_before_correction() {
        let topics = vec![
            topic("zero", 0.0),
            topic("small", 0.5),
            topic("big", 99.5),
        ];
        let distribution = calculate_question_distribution(&topics, 40);
        for dist in &distribution {
            if dist.weightage < 99.0 {
                assert!(dist.questions_to_generate >= 1, "{} dropped", dist.topic_name);
            }
        }
        assert_eq!(total_questions_from_distribution(&distribution), 40);
    }

    // The single-step correction deliberately does not clamp: when the floor
    // guarantees overshoot a small total, the top-weightage quota goes
    // negative. This mirrors the historical behavior and must not be "fixed".
    #[test]
    fn five_zero_weight_topics_drive_top_quota_negative() {
        let topics = vec![
            topic("A", 0.0),
            topic("B", 0.0),
            topic("C", 0.0),
            topic("D", 0.0),
            topic("E", 0.0),
        ];
        let distribution = calculate_question_distribution(&topics, 2);
        assert_eq!(quotas(&distribution), vec![-2, 1, 1, 1, 1]);
        assert_eq!(total_questions_from_distribution(&distribution), 2);
    }

    #[test]
    fn output_is_deterministic_and_keeps_input_order() {
        let topics = vec![topic("C", 20.0), topic("A", 50.0), topic("B", 30.0)];
        let first = calculate_question_distribution(&topics, 13);
        let second = calculate_question_distribution(&topics, 13);
        assert_eq!(first, second);

        let names: Vec<&str> = first.iter().map(|d| d.topic_name.as_str()).collect();
        assert_eq!(names, vec!["C", "A", "B"]);
    }

    #[test]
    fn empty_topic_list_yields_empty_distribution() {
        let distribution = calculate_question_distribution(&[], 10);
        assert!(distribution.is_empty());
    }
}
