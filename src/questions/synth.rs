// src/questions/synth.rs

//! Local question synthesizer.
//!
//! A fixed list of parameterised templates. Each template draws bounded
//! random parameters, computes the answer, builds three numerically adjacent
//! distractors and shuffles. Batches walk the list round-robin, so any
//! amount can be produced without a network.
//!
//! Fractional answers are computed in fixed-point integers so that options
//! render without float noise.

use fastrand::Rng;

use crate::questions::{shuffle_with_answer, IdSequence, Question, QuestionId};
use crate::util::{div_round, format_fixed};

const QUANT: &str = "Quantitative Aptitude";
const LOGICAL: &str = "Logical Reasoning";

pub struct Template {
    #[allow(dead_code)]
    pub title: &'static str,
    pub generate: fn(QuestionId, &mut Rng) -> Question,
}

pub const TEMPLATES: &[Template] = &[
    Template { title: "Time and Work", generate: time_and_work },
    Template { title: "Percentage", generate: percentage_net_change },
    Template { title: "Ratio and Proportion", generate: ratio_ages },
    Template { title: "Number Series", generate: number_series },
    Template { title: "Profit and Loss", generate: profit_and_loss },
    Template { title: "Speed and Distance", generate: speed_and_distance },
    Template { title: "Simple Interest", generate: simple_interest },
    Template { title: "Average", generate: average },
    Template { title: "Logical Reasoning", generate: letter_coding },
    Template { title: "Percentage Calculation", generate: percentage_of_total },
];

/// Produce `amount` questions, cycling through the templates in order.
pub fn generate(amount: usize, rng: &mut Rng) -> Vec<Question> {
    let ids = IdSequence::new("gen", rng);

    (0..amount)
        .map(|i| {
            let template = &TEMPLATES[i % TEMPLATES.len()];
            (template.generate)(ids.id(i), rng)
        })
        .collect()
}

/// Shuffle `options` (correct one first) and assemble the question.
fn finish(
    id: QuestionId,
    title: &str,
    question: String,
    options: [String; 4],
    explanation: String,
    category: &str,
    rng: &mut Rng,
) -> Question {
    let (options, correct_answer) = shuffle_with_answer(Vec::from(options), 0, rng);

    Question {
        id,
        title: title.to_string(),
        question,
        options,
        correct_answer,
        explanation,
        category: category.to_string(),
        tags: None,
    }
}

/// A distractor `step` under `value`, or `3 * step` over it when the lower
/// one would be implausibly small. Never collides with `value + step` or
/// `value + 2 * step`.
fn below(value: i64, step: i64) -> i64 {
    if value > 2 * step {
        value - step
    } else {
        value + 3 * step
    }
}

fn time_and_work(id: QuestionId, rng: &mut Rng) -> Question {
    let a = rng.i64(5..=14);
    let b = rng.i64(5..=14);
    // days together, in tenths
    let together = div_round(a * b * 10, a + b);
    let days = |tenths: i64| format!("{} days", format_fixed(tenths, 1));

    finish(
        id,
        "Time and Work",
        format!(
            "A can do a piece of work in {a} days and B can do it in {b} days. \
             In how many days will they complete the work if they work together?"
        ),
        [days(together), days(together + 10), days(together - 10), days(together + 20)],
        format!(
            "A's 1 day work = 1/{a}, B's 1 day work = 1/{b}. Together: 1/{a} + 1/{b} = {}/{}. \
             So they will complete the work in about {} days.",
            a + b,
            a * b,
            format_fixed(together, 1)
        ),
        QUANT,
        rng,
    )
}

fn percentage_net_change(id: QuestionId, rng: &mut Rng) -> Question {
    let percent = rng.i64(10..=29);
    // net change, in hundredths of a percent
    let net = percent * percent;

    finish(
        id,
        "Percentage",
        format!(
            "If the price of a product is increased by {percent}% and then decreased by {percent}%, \
             what is the net change in price?"
        ),
        [
            format!("{}% decrease", format_fixed(net, 2)),
            "No change".to_string(),
            format!("{}% increase", format_fixed(net, 2)),
            format!("{}% decrease", format_fixed(net * 2, 2)),
        ],
        format!(
            "Let original price = 100. After {percent}% increase: {}. After {percent}% decrease: \
             {} - ({percent}% of {}) = {}. Net change = {}% decrease.",
            100 + percent,
            100 + percent,
            100 + percent,
            format_fixed(10_000 - net, 2),
            format_fixed(net, 2)
        ),
        QUANT,
        rng,
    )
}

fn ratio_ages(id: QuestionId, rng: &mut Rng) -> Question {
    let r1 = rng.i64(2..=4);
    let r2 = r1 + 1;
    // With consecutive ratio terms moving to the next pair, x equals the years elapsed.
    let years = rng.i64(3..=7);
    let x = years;
    let age = r1 * x;
    let aged = |n: i64| format!("{} years", n);

    finish(
        id,
        "Ratio and Proportion",
        format!(
            "The ratio of the ages of A and B is {r1}:{r2}. After {years} years, the ratio becomes {}:{}. \
             What is the present age of A?",
            r1 + 1,
            r2 + 1
        ),
        [aged(age), aged(age + 5), aged(below(age, 5)), aged(age + 10)],
        format!(
            "Let A's age = {r1}x, B's age = {r2}x. After {years} years: ({r1}x+{years})/({r2}x+{years}) = {}/{}. \
             Solving gives x = {x}. A's age = {r1}×{x} = {age} years.",
            r1 + 1,
            r2 + 1
        ),
        QUANT,
        rng,
    )
}

fn number_series(id: QuestionId, rng: &mut Rng) -> Question {
    let n = rng.i64(1..=5);
    let term = |k: i64| (n + k) * (n + k + 1);
    let next = term(4);

    finish(
        id,
        "Number Series",
        format!(
            "Find the next number in the series: {}, {}, {}, {}, ?",
            term(0),
            term(1),
            term(2),
            term(3)
        ),
        [
            next.to_string(),
            (next + 2).to_string(),
            (next - 2).to_string(),
            (next + 4).to_string(),
        ],
        format!(
            "The pattern is: n×(n+1). So next is {}×{} = {next}.",
            n + 4,
            n + 5
        ),
        LOGICAL,
        rng,
    )
}

fn profit_and_loss(id: QuestionId, rng: &mut Rng) -> Question {
    let cp = rng.i64(50..=99);
    let profit = rng.i64(10..=39);
    let sp = div_round(cp * (100 + profit), 100);
    let rupees = |v: i64| format!("Rs. {}", v);

    finish(
        id,
        "Profit and Loss",
        format!(
            "A shopkeeper sells an article at a profit of {profit}%. \
             If the selling price is Rs. {sp}, find the cost price."
        ),
        [rupees(cp), rupees(cp + 10), rupees(cp - 10), rupees(cp + 20)],
        format!(
            "Let CP = x. SP = x + ({profit}% of x) = {}x = {sp}. So x = {sp} / {} ≈ Rs. {cp}.",
            format_fixed(100 + profit, 2),
            format_fixed(100 + profit, 2)
        ),
        QUANT,
        rng,
    )
}

fn speed_and_distance(id: QuestionId, rng: &mut Rng) -> Question {
    let speed = rng.i64(30..=79);
    let time = rng.i64(2..=6);
    let distance = speed * time;
    let km = |v: i64| format!("{} km", v);

    finish(
        id,
        "Speed and Distance",
        format!("A train travels at {speed} km/hr for {time} hours. What distance does it cover?"),
        [km(distance), km(distance + 10), km(distance - 10), km(distance + 20)],
        format!("Distance = Speed × Time = {speed} km/hr × {time} hr = {distance} km."),
        QUANT,
        rng,
    )
}

fn simple_interest(id: QuestionId, rng: &mut Rng) -> Question {
    let principal = rng.i64(100..=599);
    let rate = rng.i64(5..=14);
    let time = rng.i64(2..=6);
    let interest = div_round(principal * rate * time, 100);
    let rupees = |v: i64| format!("Rs. {}", v);

    finish(
        id,
        "Simple Interest",
        format!("Find the simple interest on Rs. {principal} at {rate}% per annum for {time} years."),
        [
            rupees(interest),
            rupees(interest + 10),
            rupees(below(interest, 10)),
            rupees(interest + 20),
        ],
        format!(
            "SI = (P × R × T) / 100 = ({principal} × {rate} × {time}) / 100 = Rs. {interest}."
        ),
        QUANT,
        rng,
    )
}

fn average(id: QuestionId, rng: &mut Rng) -> Question {
    let nums: [i64; 4] = [
        rng.i64(10..=59),
        rng.i64(10..=59),
        rng.i64(10..=59),
        rng.i64(10..=59),
    ];
    let sum: i64 = nums.iter().sum();
    let avg = div_round(sum, 4);

    finish(
        id,
        "Average",
        format!(
            "Find the average of {}, {}, {}, and {}.",
            nums[0], nums[1], nums[2], nums[3]
        ),
        [
            avg.to_string(),
            (avg + 1).to_string(),
            (avg - 1).to_string(),
            (avg + 2).to_string(),
        ],
        format!(
            "Average = Sum of numbers / Count = ({} + {} + {} + {}) / 4 = {sum} / 4 ≈ {avg}.",
            nums[0], nums[1], nums[2], nums[3]
        ),
        QUANT,
        rng,
    )
}

fn letter_coding(id: QuestionId, rng: &mut Rng) -> Question {
    const LETTERS: [char; 8] = ['A', 'B', 'C', 'D', 'E', 'F', 'G', 'H'];
    let start = rng.usize(0..=3);
    let pos = |c: char| c as u32 - 'A' as u32 + 1;
    let coded = |c: char| format!("{}-{}", c, pos(c));
    let shown = &LETTERS[start..start + 4];
    let next = LETTERS[start + 4];

    let rest = shown[1..]
        .iter()
        .map(|&c| format!("{} as {}", c, pos(c)))
        .collect::<Vec<_>>()
        .join(", ");

    finish(
        id,
        "Logical Reasoning",
        format!(
            "If {} is coded as {}, {}, how will {} be coded?",
            shown[0],
            pos(shown[0]),
            rest,
            next
        ),
        [coded(next), coded(shown[3]), coded(shown[2]), coded(shown[1])],
        format!(
            "Each letter is coded as its position in the alphabet. {} is letter number {}, so it is coded as {}.",
            next,
            pos(next),
            pos(next)
        ),
        LOGICAL,
        rng,
    )
}

fn percentage_of_total(id: QuestionId, rng: &mut Rng) -> Question {
    let total = rng.i64(100..=199);
    let part = rng.i64(10..=total - 11);
    let percentage = div_round(part * 100, total);
    let pct = |v: i64| format!("{}%", v);

    finish(
        id,
        "Percentage Calculation",
        format!("What percentage of {total} is {part}?"),
        [
            pct(percentage),
            pct(percentage + 5),
            pct(below(percentage, 5)),
            pct(percentage + 10),
        ],
        format!(
            "Percentage = (Part / Total) × 100 = ({part} / {total}) × 100 ≈ {percentage}%."
        ),
        QUANT,
        rng,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;
    use std::collections::HashSet;

    fn numbers(text: &str) -> Vec<i64> {
        Regex::new(r"\d+")
            .unwrap()
            .find_iter(text)
            .map(|m| m.as_str().parse().unwrap())
            .collect()
    }

    /// Generate many instances of one template with varying seeds.
    fn instances(title: &str) -> Vec<Question> {
        let template = TEMPLATES.iter().find(|t| t.title == title).unwrap();
        (0..200u64)
            .map(|seed| {
                let mut rng = Rng::with_seed(seed);
                (template.generate)(QuestionId(format!("t{}", seed)), &mut rng)
            })
            .collect()
    }

    fn round_half_up(x: f64) -> i64 {
        (x + 0.5).floor() as i64
    }

    #[test]
    fn every_template_is_well_formed_with_distinct_options() {
        for template in TEMPLATES {
            for q in instances(template.title) {
                assert!(q.is_well_formed(), "{}: {:?}", template.title, q);
                let distinct: HashSet<_> = q.options.iter().collect();
                assert_eq!(distinct.len(), 4, "{}: {:?}", template.title, q.options);
                assert_eq!(q.title, template.title);
            }
        }
    }

    #[test]
    fn lower_distractors_stay_plausible() {
        for title in ["Ratio and Proportion", "Simple Interest", "Percentage Calculation"] {
            for q in instances(title) {
                for option in &q.options {
                    let value = numbers(option)[0];
                    assert!(value >= 2, "{}: {:?}", title, q.options);
                }
            }
        }
        assert_eq!(below(6, 5), 21);
        assert_eq!(below(11, 5), 6);
    }

    #[test]
    fn round_robin_visits_each_template_twice_in_order() {
        let mut rng = Rng::with_seed(11);
        let batch = generate(2 * TEMPLATES.len(), &mut rng);

        let titles: Vec<&str> = batch.iter().map(|q| q.title.as_str()).collect();
        let expected: Vec<&str> = TEMPLATES
            .iter()
            .chain(TEMPLATES.iter())
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, expected);

        let ids: HashSet<_> = batch.iter().map(|q| q.id.clone()).collect();
        assert_eq!(ids.len(), batch.len());
    }

    #[test]
    fn same_seed_same_batch() {
        let a = generate(5, &mut Rng::with_seed(99));
        let b = generate(5, &mut Rng::with_seed(99));
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.question, y.question);
            assert_eq!(x.options, y.options);
            assert_eq!(x.correct_answer, y.correct_answer);
        }
    }

    #[test]
    fn time_and_work_answer() {
        for q in instances("Time and Work") {
            let n = numbers(&q.question);
            let (a, b) = (n[0] as f64, n[1] as f64);
            let expected = (a * b * 10.0 / (a + b)).round() / 10.0;
            let shown: f64 = q.correct_option().trim_end_matches(" days").parse().unwrap();
            assert!((shown - expected).abs() < 1e-9, "{} vs {}", shown, expected);
        }
    }

    #[test]
    fn percentage_net_change_answer() {
        for q in instances("Percentage") {
            let p = numbers(&q.question)[0] as f64;
            let expected = p * p / 100.0;
            let shown = q.correct_option();
            assert!(shown.ends_with("% decrease"), "{}", shown);
            let value: f64 = shown.trim_end_matches("% decrease").parse().unwrap();
            assert!((value - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn ratio_ages_answer() {
        for q in instances("Ratio and Proportion") {
            // r1:r2, years, n1:n2
            let n = numbers(&q.question);
            let (r1, r2, years, n1, n2) = (n[0], n[1], n[2], n[3], n[4]);
            // (r1 x + y) / (r2 x + y) = n1 / n2
            let x = years * (n1 - n2) / (n2 * r1 - n1 * r2);
            assert_eq!(q.correct_option(), format!("{} years", r1 * x));
        }
    }

    #[test]
    fn number_series_answer() {
        for q in instances("Number Series") {
            let n = numbers(&q.question);
            let first = n[0];
            let k = (1..10).find(|k| k * (k + 1) == first).unwrap();
            assert_eq!(n[1], (k + 1) * (k + 2));
            assert_eq!(q.correct_option(), ((k + 4) * (k + 5)).to_string());
        }
    }

    #[test]
    fn profit_and_loss_answer() {
        for q in instances("Profit and Loss") {
            let n = numbers(&q.question);
            let (profit, sp) = (n[0] as f64, n[1] as f64);
            let cp = round_half_up(sp * 100.0 / (100.0 + profit));
            assert_eq!(q.correct_option(), format!("Rs. {}", cp));
        }
    }

    #[test]
    fn speed_and_distance_answer() {
        for q in instances("Speed and Distance") {
            let n = numbers(&q.question);
            assert_eq!(q.correct_option(), format!("{} km", n[0] * n[1]));
        }
    }

    #[test]
    fn simple_interest_answer() {
        for q in instances("Simple Interest") {
            let n = numbers(&q.question);
            let (p, r, t) = (n[0] as f64, n[1] as f64, n[2] as f64);
            let si = round_half_up(p * r * t / 100.0);
            assert_eq!(q.correct_option(), format!("Rs. {}", si));
        }
    }

    #[test]
    fn average_answer() {
        for q in instances("Average") {
            let n = numbers(&q.question);
            let avg = round_half_up(n.iter().sum::<i64>() as f64 / 4.0);
            assert_eq!(q.correct_option(), avg.to_string());
        }
    }

    #[test]
    fn letter_coding_answer() {
        let asked = Regex::new(r"how will ([A-H]) be coded").unwrap();
        for q in instances("Logical Reasoning") {
            let letter = asked.captures(&q.question).unwrap()[1].chars().next().unwrap();
            let position = letter as u32 - 'A' as u32 + 1;
            assert_eq!(q.correct_option(), format!("{}-{}", letter, position));
        }
    }

    #[test]
    fn percentage_of_total_answer() {
        for q in instances("Percentage Calculation") {
            let n = numbers(&q.question);
            let (total, part) = (n[0] as f64, n[1] as f64);
            let pct = round_half_up(part * 100.0 / total);
            assert_eq!(q.correct_option(), format!("{}%", pct));
        }
    }
}
