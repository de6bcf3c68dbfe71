use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Technology alias table linking near-synonym skill spellings.
/// A pair matches when one side contains the canonical name and the other
/// contains one of its variants.
static TECH_ALIASES: LazyLock<Vec<(&'static str, &'static [&'static str])>> =
    LazyLock::new(|| {
        vec![
            ("mongodb", &["mongo", "nosql"] as &[&str]),
            ("mongoose", &["mongodb", "orm"]),
            ("javascript", &["js", "ecmascript"]),
            ("typescript", &["ts"]),
            ("reactjs", &["react"]),
            ("react.js", &["react"]),
            ("nodejs", &["node"]),
            ("node.js", &["node"]),
            ("expressjs", &["express"]),
            ("express.js", &["express"]),
            ("nestjs", &["nest"]),
            ("postgresql", &["postgres", "psql"]),
            ("mysql", &["sql", "mariadb"]),
            ("aws", &["amazon", "cloud"]),
            ("azure", &["microsoft", "cloud"]),
            ("docker", &["container"]),
            ("kubernetes", &["k8s", "container orchestration"]),
        ]
    });

/// Lowercased, NFKC-normalized, trimmed form used for comparisons.
pub fn normalize_skill(raw: &str) -> String {
    raw.nfkc().collect::<String>().trim().to_lowercase()
}

/// Split a comma-separated requirement string ("NodeJS, Mongoose") into
/// individual skill tokens.
pub fn parse_job_skills(raw: Option<&str>) -> Vec<String> {
    raw.map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// Candidate skills that plausibly satisfy one of the job's required skills:
/// substring containment in either direction, or an alias-table link. The
/// returned strings keep the candidate's original spelling, first-seen order,
/// without duplicates.
pub fn find_potential_matches(candidate_skills: &[String], job_skills: &[String]) -> Vec<String> {
    let mut matches: Vec<String> = Vec::new();

    for raw in candidate_skills {
        let candidate = normalize_skill(raw);
        if candidate.is_empty() {
            continue;
        }

        for raw_job in job_skills {
            let job = normalize_skill(raw_job);
            if job.is_empty() {
                continue;
            }

            let direct = candidate.contains(&job) || job.contains(&candidate);
            let via_alias = TECH_ALIASES.iter().any(|(tech, variants)| {
                (candidate.contains(tech) && variants.iter().any(|v| job.contains(v)))
                    || (job.contains(tech) && variants.iter().any(|v| candidate.contains(v)))
            });

            if (direct || via_alias) && !matches.iter().any(|seen| seen == raw) {
                matches.push(raw.clone());
            }
        }
    }

    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skills(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn alias_table_links_node_and_mongoose_spellings() {
        let candidate = skills(&["Node.js", "MongoDB"]);
        let job = parse_job_skills(Some("NodeJS, Mongoose"));

        let matches = find_potential_matches(&candidate, &job);

        assert_eq!(matches, vec!["Node.js".to_string(), "MongoDB".to_string()]);
    }

    #[test]
    fn containment_matches_both_directions() {
        let matches = find_potential_matches(
            &skills(&["JavaScript"]),
            &skills(&["JavaScript/TypeScript"]),
        );
        assert_eq!(matches, vec!["JavaScript".to_string()]);

        let matches =
            find_potential_matches(&skills(&["React Native"]), &skills(&["React"]));
        assert_eq!(matches, vec!["React Native".to_string()]);
    }

    #[test]
    fn unrelated_skills_do_not_match() {
        let matches = find_potential_matches(&skills(&["Photoshop"]), &skills(&["Rust"]));
        assert!(matches.is_empty());
    }

    #[test]
    fn duplicates_reported_once() {
        let matches = find_potential_matches(
            &skills(&["Docker"]),
            &skills(&["Docker", "Containers", "docker"]),
        );
        assert_eq!(matches, vec!["Docker".to_string()]);
    }

    #[test]
    fn parse_job_skills_trims_and_drops_empties() {
        assert_eq!(
            parse_job_skills(Some(" NodeJS ,, Mongoose ")),
            vec!["NodeJS".to_string(), "Mongoose".to_string()]
        );
        assert!(parse_job_skills(None).is_empty());
    }

    #[test]
    fn normalization_folds_case_and_width() {
        assert_eq!(normalize_skill("  ＮｏｄｅＪＳ "), "nodejs");
    }
}
