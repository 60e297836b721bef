//! The numbered genre list shared by ID3v1 and ID3v2 `TCON` references.

pub const GENRES: [&str; 192] = [
    "Blues",
    "Classic Rock",
    "Country",
    "Dance",
    "Disco",
    "Funk",
    "Grunge",
    "Hip-Hop",
    "Jazz",
    "Metal",
    "New Age",
    "Oldies",
    "Other",
    "Pop",
    "R&B",
    "Rap",
    "Reggae",
    "Rock",
    "Techno",
    "Industrial",
    "Alternative",
    "Ska",
    "Death Metal",
    "Pranks",
    "Soundtrack",
    "Euro-Techno",
    "Ambient",
    "Trip-Hop",
    "Vocal",
    "Jazz+Funk",
    "Fusion",
    "Trance",
    "Classical",
    "Instrumental",
    "Acid",
    "House",
    "Game",
    "Sound Clip",
    "Gospel",
    "Noise",
    "Alt. Rock",
    "Bass",
    "Soul",
    "Punk",
    "Space",
    "Meditative",
    "Instrumental Pop",
    "Instrumental Rock",
    "Ethnic",
    "Gothic",
    "Darkwave",
    "Techno-Industrial",
    "Electronic",
    "Pop-Folk",
    "Eurodance",
    "Dream",
    "Southern Rock",
    "Comedy",
    "Cult",
    "Gangsta Rap",
    "Top 40",
    "Christian Rap",
    "Pop/Funk",
    "Jungle",
    "Native American",
    "Cabaret",
    "New Wave",
    "Psychedelic",
    "Rave",
    "Showtunes",
    "Trailer",
    "Lo-Fi",
    "Tribal",
    "Acid Punk",
    "Acid Jazz",
    "Polka",
    "Retro",
    "Musical",
    "Rock & Roll",
    "Hard Rock",
    "Folk",
    "Folk-Rock",
    "National Folk",
    "Swing",
    "Fast-Fusion",
    "Bebop",
    "Latin",
    "Revival",
    "Celtic",
    "Bluegrass",
    "Avantgarde",
    "Gothic Rock",
    "Progressive Rock",
    "Psychedelic Rock",
    "Symphonic Rock",
    "Slow Rock",
    "Big Band",
    "Chorus",
    "Easy Listening",
    "Acoustic",
    "Humour",
    "Speech",
    "Chanson",
    "Opera",
    "Chamber Music",
    "Sonata",
    "Symphony",
    "Booty Bass",
    "Primus",
    "Porn Groove",
    "Satire",
    "Slow Jam",
    "Club",
    "Tango",
    "Samba",
    "Folklore",
    "Ballad",
    "Power Ballad",
    "Rhythmic Soul",
    "Freestyle",
    "Duet",
    "Punk Rock",
    "Drum Solo",
    "A Cappella",
    "Euro-House",
    "Dance Hall",
    "Goa",
    "Drum & Bass",
    "Club-House",
    "Hardcore",
    "Terror",
    "Indie",
    "BritPop",
    "Afro-Punk",
    "Polsk Punk",
    "Beat",
    "Christian Gangsta Rap",
    "Heavy Metal",
    "Black Metal",
    "Crossover",
    "Contemporary Christian",
    "Christian Rock",
    "Merengue",
    "Salsa",
    "Thrash Metal",
    "Anime",
    "JPop",
    "Synthpop",
    "Abstract",
    "Art Rock",
    "Baroque",
    "Bhangra",
    "Big Beat",
    "Breakbeat",
    "Chillout",
    "Downtempo",
    "Dub",
    "EBM",
    "Eclectic",
    "Electro",
    "Electroclash",
    "Emo",
    "Experimental",
    "Garage",
    "Global",
    "IDM",
    "Illbient",
    "Industro-Goth",
    "Jam Band",
    "Krautrock",
    "Leftfield",
    "Lounge",
    "Math Rock",
    "New Romantic",
    "Nu-Breakz",
    "Post-Punk",
    "Post-Rock",
    "Psytrance",
    "Shoegaze",
    "Space Rock",
    "Trop Rock",
    "World Music",
    "Neoclassical",
    "Audiobook",
    "Audio Theatre",
    "Neue Deutsche Welle",
    "Podcast",
    "Indie Rock",
    "G-Funk",
    "Dubstep",
    "Garage Rock",
    "Psybient",
];

/// Name of genre number `n`; numbers past the table are "Unknown".
pub fn genre_name(n: usize) -> &'static str {
    GENRES.get(n).copied().unwrap_or("Unknown")
}

/// Number of a genre name, compared case-insensitively.
pub fn genre_number(name: &str) -> Option<u8> {
    GENRES
        .iter()
        .position(|g| g.eq_ignore_ascii_case(name))
        .map(|n| n as u8)
}

/// Expands one `TCON` value into genre names.
///
/// Handles the v2.3 reference form `(17)(31)Refinement`, the `(RX)` and
/// `(CR)` keywords, `((` as an escaped parenthesis, and bare numbers as
/// written by v2.4 taggers. Anything else is taken literally.
pub fn resolve_tcon(value: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut rest = value;
    while let Some(body) = rest.strip_prefix('(') {
        if body.starts_with('(') {
            break;
        }
        let Some(close) = body.find(')') else {
            break;
        };
        let token = &body[..close];
        match token {
            "RX" => out.push("Remix".to_string()),
            "CR" => out.push("Cover".to_string()),
            _ => match token.parse::<usize>() {
                Ok(n) => out.push(genre_name(n).to_string()),
                Err(_) => break,
            },
        }
        rest = &body[close + 1..];
    }
    let rest = rest.strip_prefix('(').filter(|r| r.starts_with('(')).unwrap_or(rest);
    if !rest.is_empty() {
        match rest.parse::<usize>() {
            Ok(n) => out.push(genre_name(n).to_string()),
            Err(_) => {
                if !out.iter().any(|g| g == rest) {
                    out.push(rest.to_string());
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_is_unknown() {
        assert_eq!(genre_name(0), "Blues");
        assert_eq!(genre_name(191), "Psybient");
        assert_eq!(genre_name(192), "Unknown");
        assert_eq!(genre_name(255), "Unknown");
    }

    #[test]
    fn tcon_references() {
        assert_eq!(resolve_tcon("(17)"), vec!["Rock"]);
        assert_eq!(resolve_tcon("(17)(31)Eurotrance"), vec!["Rock", "Trance", "Eurotrance"]);
        assert_eq!(resolve_tcon("(RX)(CR)"), vec!["Remix", "Cover"]);
        assert_eq!(resolve_tcon("((Weird)"), vec!["(Weird)"]);
        assert_eq!(resolve_tcon("8"), vec!["Jazz"]);
        assert_eq!(resolve_tcon("Shoegaze"), vec!["Shoegaze"]);
        assert_eq!(resolve_tcon("(200)"), vec!["Unknown"]);
        assert_eq!(genre_number("rock"), Some(17));
    }
}
