//! Fixed catalog of reviewable movies, shared by both shells

use crate::types::Movie;

/// Movies offered for review, in display order
pub static MOVIES: [Movie; 4] = [
    Movie {
        id: "deadpool-and-wolverine",
        title: "Deadpool & Wolverine",
        poster_url: "https://image.tmdb.org/t/p/w500/8cdWjvZQUExUUTzyp4t6EDMubfO.jpg",
    },
    Movie {
        id: "gladiator-ii",
        title: "Gladiator II",
        poster_url: "https://image.tmdb.org/t/p/w500/2cxhvwyEwRlysAmRH4iodkvo0z5.jpg",
    },
    Movie {
        id: "moana-2",
        title: "Moana 2",
        poster_url: "https://image.tmdb.org/t/p/w500/aLVkiINlIeCkcZIzb7XHzPYgO6L.jpg",
    },
    Movie {
        id: "mufasa-the-lion-king",
        title: "Mufasa: The Lion King",
        poster_url: "https://image.tmdb.org/t/p/w500/lurEK87kukWNaHd0zYnsi3yzJrs.jpg",
    },
];

/// All movies
pub fn movies() -> &'static [Movie] {
    &MOVIES
}

/// Look up a movie by id
pub fn find(id: &str) -> Option<&'static Movie> {
    MOVIES.iter().find(|movie| movie.id == id)
}
