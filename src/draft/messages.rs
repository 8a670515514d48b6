// src/draft/messages.rs
// Localised user-facing messages

use super::DraftError;
use crate::config::Language;
use crate::model::ModelChoice;

const BYTES_PER_MB: usize = 1024 * 1024;

fn to_mb(bytes: usize) -> usize {
    (bytes + BYTES_PER_MB / 2) / BYTES_PER_MB
}

pub fn for_error(error: &DraftError, language: Language) -> String {
    match (error, language) {
        (DraftError::MissingAudio, Language::En) => "No audio file provided".to_string(),
        (DraftError::MissingAudio, Language::Fr) => "Aucun fichier audio fourni".to_string(),

        (DraftError::PayloadTooLarge { size, max }, Language::En) => format!(
            "File too large ({}MB). Maximum: {}MB",
            to_mb(*size),
            to_mb(*max)
        ),
        (DraftError::PayloadTooLarge { size, max }, Language::Fr) => format!(
            "Fichier trop volumineux ({}MB). Maximum : {}MB",
            to_mb(*size),
            to_mb(*max)
        ),
        (DraftError::UploadTooLarge { max }, Language::En) => {
            format!("File too large. Maximum: {}MB", to_mb(*max))
        }
        (DraftError::UploadTooLarge { max }, Language::Fr) => {
            format!("Fichier trop volumineux. Maximum : {}MB", to_mb(*max))
        }
        (DraftError::ProviderRejectedSize, Language::En) => "Audio file too large".to_string(),
        (DraftError::ProviderRejectedSize, Language::Fr) => {
            "Fichier audio trop volumineux".to_string()
        }

        (DraftError::UnsupportedFormat(_), Language::En) => {
            "Unsupported audio format or corrupt file".to_string()
        }
        (DraftError::UnsupportedFormat(_), Language::Fr) => {
            "Format audio non supporté ou fichier corrompu".to_string()
        }

        (DraftError::MalformedRequest(_), Language::En) => {
            "Could not read the uploaded form".to_string()
        }
        (DraftError::MalformedRequest(_), Language::Fr) => {
            "Impossible de lire le formulaire envoyé".to_string()
        }

        (DraftError::Timeout, Language::En) => {
            "Timeout: the audio took too long to process".to_string()
        }
        (DraftError::Timeout, Language::Fr) => {
            "Timeout : le fichier audio est trop long à traiter".to_string()
        }

        (DraftError::QuotaExceeded, Language::En) => {
            "API quota exceeded, please try again later".to_string()
        }
        (DraftError::QuotaExceeded, Language::Fr) => {
            "Quota API dépassé, réessayez plus tard".to_string()
        }

        (DraftError::Transient, Language::En) => {
            "The AI service is temporarily unavailable, please try again".to_string()
        }
        (DraftError::Transient, Language::Fr) => {
            "Le service IA est momentanément indisponible, réessayez".to_string()
        }

        (DraftError::Fatal, Language::En) => "The AI service rejected the request".to_string(),
        (DraftError::Fatal, Language::Fr) => "Le service IA a refusé la requête".to_string(),

        (DraftError::EmptyResponse, Language::En) => "Empty response from the model".to_string(),
        (DraftError::EmptyResponse, Language::Fr) => "Réponse vide du modèle".to_string(),
    }
}

pub fn fallback_note(from: ModelChoice, to: ModelChoice, language: Language) -> String {
    match language {
        Language::En => format!(
            "Quota reached for {}, automatically fell back to {}",
            from.label(),
            to.label()
        ),
        Language::Fr => format!(
            "Quota atteint pour {}, fallback automatique sur {}",
            from.label(),
            to.label()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_message_in_mb() {
        let err = DraftError::PayloadTooLarge {
            size: 5 * BYTES_PER_MB,
            max: 4 * BYTES_PER_MB,
        };
        assert_eq!(for_error(&err, Language::En), "File too large (5MB). Maximum: 4MB");
    }

    #[test]
    fn test_fallback_note() {
        assert_eq!(
            fallback_note(ModelChoice::Accurate, ModelChoice::Fast, Language::Fr),
            "Quota atteint pour Pro, fallback automatique sur Flash"
        );
    }
}
