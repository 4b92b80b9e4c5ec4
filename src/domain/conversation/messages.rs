//! Fixed texts the assistant sends to users.

pub const GREETING: &str = "¡Hola! Soy tu nutricionista virtual 🥗. Antes de empezar, \
contame: ¿qué tipo de dieta seguís? (por ejemplo: keto, vegana, sin gluten, para diabéticos)";

pub const DIET_REPROMPT: &str = "No entendí tu dieta. Escribí en un mensaje de texto \
qué tipo de dieta seguís (por ejemplo: keto, vegana, sin gluten).";

pub const QUERY_REPROMPT: &str = "Tu mensaje llegó vacío. Escribí qué alimento querés \
consultar o mandame una foto.";

pub const UNSUPPORTED_KIND: &str = "Por ahora solo puedo leer mensajes de texto o imágenes. \
Mandame tu consulta como texto o como foto.";

pub const ANOTHER_QUERY: &str = "¿Querés hacer otra consulta? Respondé sí o no.";

pub const NEXT_QUERY: &str = "¡Genial! Contame qué alimento querés consultar o mandame una foto.";

pub const YES_OR_NO: &str = "Perdón, no te entendí. Respondé sí o no, por favor.";

pub const CLOSING: &str = "¡Gracias por tu consulta! Cuando quieras volver a hablar, \
mandame un mensaje. 👋";

pub const UPSTREAM_APOLOGY: &str = "Perdón, ocurrió un error al procesar tu consulta. \
Por favor, volvé a enviarla en unos minutos.";

pub const RESET_APOLOGY: &str = "Perdón, tuve un problema con nuestra conversación y tuve \
que reiniciarla. Escribime de nuevo para empezar.";

/// Confirmation sent after the diet is recorded.
pub fn diet_confirmation(diet: &str) -> String {
    format!(
        "Perfecto, tomé nota de tu dieta: {}. Ahora contame qué alimento querés consultar \
o mandame una foto.",
        diet
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diet_confirmation_mentions_diet() {
        assert!(diet_confirmation("keto").contains("keto"));
    }

    #[test]
    fn yes_no_prompts_name_both_answers() {
        for text in [ANOTHER_QUERY, YES_OR_NO] {
            assert!(text.contains("sí"));
            assert!(text.contains("no"));
        }
    }
}
