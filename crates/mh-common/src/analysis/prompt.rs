use crate::matching::{find_potential_matches, parse_job_skills};
use crate::{Candidate, JobPosting};

const NOT_SPECIFIED: &str = "Non spécifié";
const NONE: &str = "Aucune";

/// Expected response shape, spelled out verbatim for the model.
const RESPONSE_SCHEMA: &str = r#"{
  "resume": {
    "score": number (0-100),
    "correspondance": {
      "competences": number (0-100),
      "experience": boolean,
      "formation": boolean,
      "langues": number (0-100)
    },
    "matchedKeywords": string[],
    "highlightsToStandOut": string[],
    "suggestions": string[]
  },
  "signauxAlerte": [
    {
      "type": "Compétence" | "Expérience" | "Formation" | "Langue",
      "probleme": string,
      "severite": "faible" | "moyenne" | "élevée",
      "score": number (0-100)
    }
  ]
}"#;

fn or_not_specified(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => NOT_SPECIFIED,
    }
}

fn join_or(items: Vec<String>, separator: &str, empty: &str) -> String {
    if items.is_empty() {
        empty.to_string()
    } else {
        items.join(separator)
    }
}

/// Heuristic pre-match: candidate skills that plausibly satisfy the posting's
/// required skills, fed back into the prompt so the model does not miss
/// near-synonym spellings.
pub fn preprocess_match_data(job: &JobPosting, candidate: &Candidate) -> Vec<String> {
    let job_skills = parse_job_skills(job.requirements.hard_skills.as_deref());
    find_potential_matches(&candidate.skills, &job_skills)
}

/// Single natural-language prompt for one candidate/job pair: requirements,
/// profile, the hint list and the strict scoring rules (weights + caps).
pub fn build_match_prompt(job: &JobPosting, candidate: &Candidate, hints: &[String]) -> String {
    let requirements = &job.requirements;

    let experiences = join_or(
        candidate
            .experience
            .iter()
            .map(|entry| {
                format!(
                    "{} chez {}",
                    entry.position.as_deref().unwrap_or(NOT_SPECIFIED),
                    entry.company.as_deref().unwrap_or(NOT_SPECIFIED)
                )
            })
            .collect(),
        "; ",
        NONE,
    );
    let formations = join_or(
        candidate
            .education
            .iter()
            .map(|entry| {
                format!(
                    "{} en {}",
                    entry.degree.as_deref().unwrap_or(NOT_SPECIFIED),
                    entry.field_of_study.as_deref().unwrap_or(NOT_SPECIFIED)
                )
            })
            .collect(),
        "; ",
        NONE,
    );

    let availability = candidate
        .availability_date
        .map(|date| date.to_string())
        .unwrap_or_else(|| NOT_SPECIFIED.to_string());

    format!(
        "Analyse le profil du candidat pour ce poste et génère UNIQUEMENT un objet JSON valide \
correspondant exactement à ce schéma:\n{schema}\n\n\
Détails du poste:\n\
Titre: {title}\n\
Niveau requis: {education_level} en {field_of_study}\n\
Expérience: {years} ans en {domain}\n\
Compétences techniques: {hard_skills}\n\
Soft Skills: {soft_skills}\n\
Langues: {languages}\n\n\
Profil du candidat:\n\
- Compétences: {skills}\n\
- Expériences: {experiences}\n\
- Formations: {formations}\n\
- Statut professionnel: {professional_status}\n\
- Situation actuelle: {employment_status}\n\
- Ville/Pays: {city}, {country}\n\
- Disponibilité: {availability}\n\n\
Règles d'analyse STRICTES:\n\
1. Le score global doit être calculé comme suit:\n\
  - 40% compétences (0-100)\n\
  - 10% langues (0-100)\n\
  - 25% expérience (0 si false, 100 si true)\n\
  - 25% formation (0 si false, 100 si true)\n\
2. experience=true UNIQUEMENT si le candidat a au moins le nombre d'années d'expérience requises\n\
3. formation=true UNIQUEMENT si le candidat a au moins le niveau d'éducation requis\n\
4. matchedKeywords DOIT contenir TOUTES les compétences du candidat qui correspondent aux \
compétences requises pour le poste\n\
5. IMPORTANT: Analyser TRÈS SOIGNEUSEMENT chaque compétence du candidat pour trouver des \
correspondances même partielles ou similaires (\"Node.js\" correspond à \"NodeJS\", \"React\" à \
\"ReactJS\", etc.)\n\
6. NE PAS IGNORER les correspondances comme \"MongoDB\" si le poste demande \"MongoDB/Mongoose\" \
ou inversement\n\
7. Si experience=false, le score global ne peut pas dépasser 50\n\
8. Si formation=false, le score global ne peut pas dépasser 50\n\
9. Si les compétences correspondent à moins de 40%, le score global ne peut pas dépasser 30\n\
10. highlightsToStandOut = 2-4 points forts du profil\n\
11. signauxAlerte = faiblesses majeures avec score et sévérité\n\n\
Context additionnel:\n\
- L'analyse est pour le marché tunisien qui a des exigences strictes pour les compétences techniques.\n\
- Fourchette salariale typique en Tunisie: 800-5000 TND selon l'expérience et les compétences.\n\
- Potentielles correspondances de compétences détectées: {hints}\n\n\
Output ONLY the JSON - no additional text, comments or markdown.",
        schema = RESPONSE_SCHEMA,
        title = or_not_specified(job.title.as_deref()),
        education_level = or_not_specified(requirements.education_level.as_deref()),
        field_of_study = or_not_specified(requirements.field_of_study.as_deref()),
        years = requirements.years_experience_required.unwrap_or(0),
        domain = or_not_specified(requirements.experience_domain.as_deref()),
        hard_skills = or_not_specified(requirements.hard_skills.as_deref()),
        soft_skills = or_not_specified(requirements.soft_skills.as_deref()),
        languages = or_not_specified(requirements.languages.as_deref()),
        skills = join_or(candidate.skills.clone(), ", ", NONE),
        experiences = experiences,
        formations = formations,
        professional_status = or_not_specified(candidate.professional_status.as_deref()),
        employment_status = or_not_specified(candidate.employment_status.as_deref()),
        city = or_not_specified(candidate.city.as_deref()),
        country = or_not_specified(candidate.country.as_deref()),
        availability = availability,
        hints = hints.join(", "),
    )
}
