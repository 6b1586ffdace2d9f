//! Response assembly.
//!
//! Fixed texts (emergency, rephrase, default pool), the quick-reply lookup table
//! and the light contextual touches applied to a chosen template.

use rand::seq::SliceRandom;
use rand::Rng;

/// Safety message returned for any emergency. Never personalised.
pub const EMERGENCY_RESPONSE: &str = "🚨 URGENCE MÉDICALE DÉTECTÉE. Composez immédiatement le 15 (SAMU) ou le 112. \
Ce chatbot ne peut pas gérer les situations d'urgence. Restez calme et suivez les instructions des secours.";

pub const EMERGENCY_QUICK_REPLIES: &[&str] = &[
    "Appeler le 15",
    "Appeler le 112",
    "Signes d'alerte",
    "Maternité la plus proche",
];

/// Returned for empty or blank questions.
pub const REPHRASE_RESPONSE: &str =
    "Je n'ai pas compris votre question. Pouvez-vous reformuler ?";

/// Used when no intent clears the acceptance threshold.
pub const DEFAULT_RESPONSES: &[&str] = &[
    "Je comprends votre préoccupation. Pour des conseils personnalisés, veuillez consulter un professionnel de santé.",
    "C'est une bonne question. Je vous recommande d'en parler avec votre sage-femme ou votre médecin lors de votre prochaine consultation.",
    "Je suis spécialisé dans les questions de santé maternelle et infantile. Pouvez-vous préciser votre question ?",
    "Pour cette question spécifique, il est préférable de consulter un professionnel de santé qui pourra vous accompagner personnellement.",
];

/// Used when a matched intent somehow has no response text.
const FALLBACK_RESPONSE: &str = "Je ne peux pas répondre à cette question pour le moment.";

const DEFAULT_QUICK_REPLIES: &[&str] = &[
    "Suivi de grossesse",
    "Vaccins de bébé",
    "Alimentation",
    "Parler à un professionnel",
];

/// Static follow-up suggestions keyed by intent tag.
const QUICK_REPLIES: &[(&str, &[&str])] = &[
    (
        "greeting",
        &["Suivi de grossesse", "Calendrier vaccinal", "Alimentation", "Signes d'urgence"],
    ),
    ("goodbye", &["Poser une autre question", "Signes d'urgence"]),
    ("thanks", &["Poser une autre question", "Calendrier vaccinal"]),
    (
        "nausea",
        &["Aliments anti-nausées", "Quand consulter ?", "Hydratation", "Fatigue"],
    ),
    (
        "nutrition",
        &["Aliments à éviter", "Compléments vitaminiques", "Prise de poids", "Nausées"],
    ),
    (
        "vaccination",
        &["Calendrier vaccinal", "Effets secondaires", "Vaccins obligatoires", "Rappels"],
    ),
    (
        "breastfeeding",
        &["Bonne position", "Crevasses", "Tire-lait", "Fréquence des tétées"],
    ),
    (
        "baby_sleep",
        &["Couchage sécurisé", "Rythme du sommeil", "Pleurs du soir", "Tétées de nuit"],
    ),
    (
        "baby_fever",
        &["Prendre la température", "Quand consulter ?", "Signes d'urgence"],
    ),
    (
        "fetal_movements",
        &["Compter les mouvements", "Quand consulter ?", "Signes d'urgence"],
    ),
    (
        "prenatal_visits",
        &["Échographies", "Examens obligatoires", "Préparation à l'accouchement"],
    ),
    (
        "fatigue",
        &["Sommeil pendant la grossesse", "Alimentation", "Quand consulter ?"],
    ),
    (
        "postpartum_mood",
        &["Baby blues", "Parler à un professionnel", "Soutien aux parents"],
    ),
    (
        "exercise",
        &["Activités conseillées", "Activités à éviter", "Rééducation périnéale"],
    ),
    (
        "emergency",
        EMERGENCY_QUICK_REPLIES,
    ),
];

/// Tags that receive a time-of-day greeting prefix.
const GREETING_TAGS: &[&str] = &["greeting", "salutation"];

/// Placeholder replaced with the user's display name.
pub const NAME_PLACEHOLDER: &str = "{name}";

/// "Bonjour" from 05:00 to 17:59, "Bonsoir" otherwise.
pub fn greeting_prefix(hour: u32) -> &'static str {
    if (5..18).contains(&hour) {
        "Bonjour"
    } else {
        "Bonsoir"
    }
}

pub fn is_greeting_tag(tag: &str) -> bool {
    GREETING_TAGS.contains(&tag)
}

/// Quick replies for `tag`, at most `limit` of them.
pub fn quick_replies_for(tag: &str, limit: usize) -> Vec<String> {
    QUICK_REPLIES
        .iter()
        .find(|(key, _)| *key == tag)
        .map(|(_, replies)| *replies)
        .unwrap_or(DEFAULT_QUICK_REPLIES)
        .iter()
        .take(limit)
        .map(|s| s.to_string())
        .collect()
}

pub fn emergency_quick_replies() -> Vec<String> {
    EMERGENCY_QUICK_REPLIES.iter().map(|s| s.to_string()).collect()
}

/// Picks one template; `None` when the list is empty.
pub fn choose_template<'a, R: Rng + ?Sized>(templates: &'a [String], rng: &mut R) -> Option<&'a str> {
    templates.choose(rng).map(String::as_str)
}

pub fn choose_default<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    DEFAULT_RESPONSES
        .choose(rng)
        .copied()
        .unwrap_or(FALLBACK_RESPONSE)
}

/// Applies the contextual touches to a template.
///
/// The `{name}` placeholder becomes the display name, or disappears together
/// with its leading space. Greeting intents are prefixed with the time-of-day
/// salutation unless the template already starts with one.
pub fn personalize(template: &str, tag: &str, display_name: Option<&str>, hour: u32) -> String {
    let mut text = match display_name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => template.replace(NAME_PLACEHOLDER, name),
        None => template
            .replace(&format!(" {}", NAME_PLACEHOLDER), "")
            .replace(NAME_PLACEHOLDER, ""),
    };

    if is_greeting_tag(tag) {
        let lowered = text.to_lowercase();
        if !lowered.starts_with("bonjour") && !lowered.starts_with("bonsoir") {
            text = format!("{} ! {}", greeting_prefix(hour), text);
        }
    }

    text
}

/// Template choice and personalization in one step.
pub fn compose<R: Rng + ?Sized>(
    templates: &[String],
    tag: &str,
    display_name: Option<&str>,
    hour: u32,
    rng: &mut R,
) -> String {
    let template = choose_template(templates, rng).unwrap_or(FALLBACK_RESPONSE);
    personalize(template, tag, display_name, hour)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_greeting_prefix_by_hour() {
        assert_eq!(greeting_prefix(5), "Bonjour");
        assert_eq!(greeting_prefix(12), "Bonjour");
        assert_eq!(greeting_prefix(17), "Bonjour");
        assert_eq!(greeting_prefix(18), "Bonsoir");
        assert_eq!(greeting_prefix(2), "Bonsoir");
    }

    #[test]
    fn test_quick_replies_lookup() {
        let nausea = quick_replies_for("nausea", 4);
        assert_eq!(nausea.len(), 4);
        assert_eq!(nausea[0], "Aliments anti-nausées");

        assert_eq!(quick_replies_for("nausea", 2).len(), 2);
        assert_eq!(quick_replies_for("unknown", 4), DEFAULT_QUICK_REPLIES);
        assert!(QUICK_REPLIES.iter().all(|(_, replies)| replies.len() <= 4));
    }

    #[test]
    fn test_name_placeholder() {
        let template = "Bonjour {name}, comment allez-vous ?";
        assert_eq!(
            personalize(template, "greeting", Some("Awa"), 9),
            "Bonjour Awa, comment allez-vous ?"
        );
        assert_eq!(
            personalize(template, "greeting", None, 9),
            "Bonjour, comment allez-vous ?"
        );
        assert_eq!(
            personalize("Merci {name} !", "thanks", Some("  "), 9),
            "Merci !"
        );
    }

    #[test]
    fn test_greeting_gets_time_of_day_prefix() {
        assert_eq!(
            personalize("Comment puis-je vous aider ?", "greeting", None, 20),
            "Bonsoir ! Comment puis-je vous aider ?"
        );
        assert_eq!(
            personalize("Comment puis-je vous aider ?", "nutrition", None, 20),
            "Comment puis-je vous aider ?"
        );
    }

    #[test]
    fn test_compose_picks_configured_template() {
        let templates = vec!["Réponse A".to_string(), "Réponse B".to_string()];
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let text = compose(&templates, "nutrition", None, 10, &mut rng);
            assert!(templates.contains(&text));
        }
        assert_eq!(compose(&[], "nutrition", None, 10, &mut rng), FALLBACK_RESPONSE);
    }

    #[test]
    fn test_seeded_choice_is_reproducible() {
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        for _ in 0..10 {
            assert_eq!(choose_default(&mut a), choose_default(&mut b));
        }
        assert!(DEFAULT_RESPONSES.contains(&choose_default(&mut a)));
    }
}
