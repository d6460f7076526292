use whatlang::{Detector, Lang};

use log::*;

/// Languages the classifiers are meant for. Latin script text always
/// lands on English.
const SUPPORTED: [Lang; 3] = [Lang::Eng, Lang::Tam, Lang::Hin];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    English,
    Multilingual,
}

/// Best guess at the language of `text`, English when there is no guess.
pub fn detect(text: &str) -> Lang {
    match Detector::with_allowlist(SUPPORTED.to_vec()).detect(text) {
        Some(info) => info.lang(),
        None => {
            trace!("No language detected, assuming English");
            Lang::Eng
        }
    }
}

pub fn route(text: &str) -> Route {
    match detect(text) {
        Lang::Eng => Route::English,
        other => {
            trace!("Routing {} text to the multilingual model", other.code());
            Route::Multilingual
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_english() {
        assert_eq!(detect(""), Lang::Eng);
        assert_eq!(route(""), Route::English);
        assert_eq!(route("1234 5678 !!!"), Route::English);
    }

    #[test]
    fn english_prose_stays_english() {
        let text = "The battery on this phone lasts the whole day and the screen is bright enough to read outside.";
        assert_eq!(route(text), Route::English);
    }

    #[test]
    fn short_comments_stay_english() {
        for text in ["Terrible experience", "love it", "Nice", "I love this!"] {
            assert_eq!(route(text), Route::English, "{}", text);
        }
    }

    #[test]
    fn other_scripts_go_multilingual() {
        assert_eq!(route("இந்த படம் மிகவும் நன்றாக இருந்தது, எல்லோரும் பார்க்க வேண்டும்"), Route::Multilingual);
        assert_eq!(route("यह फिल्म बहुत अच्छी थी और मुझे इसकी कहानी बहुत पसंद आई"), Route::Multilingual);
        assert_eq!(detect("மிகவும் நன்று"), Lang::Tam);
    }
}
