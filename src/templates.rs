use maud::{DOCTYPE, Markup, html};

use crate::{
    models::{EARLIEST_FILM_YEAR, Movie},
    store::{ClientState, Filter, SavingKey},
};

const TAILWIND_CDN: &str = "https://cdn.tailwindcss.com";

const INPUT_CLASS: &str = "mt-2 w-full rounded-md border border-gray-300 px-3 py-2 focus:border-blue-500 focus:outline-none focus:ring-1 focus:ring-blue-500";

pub fn index_page(state: &ClientState) -> String {
    page(
        "FilmTrack",
        html! {
            div class="min-h-screen bg-gray-50" {
                div class="max-w-5xl mx-auto px-6 py-12 space-y-8" {
                    (hero(state))
                    @if state.show_stats {
                        (stats_panel(state))
                    }
                    main class="grid gap-8 md:grid-cols-2" {
                        (form_panel(state))
                        (list_panel(state))
                    }
                }
            }
        },
    )
}

fn page(title: &str, body: Markup) -> String {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
                script src=(TAILWIND_CDN) {}
            }
            body { (body) }
        }
    }
    .into_string()
}

fn hero(state: &ClientState) -> Markup {
    html! {
        header class="bg-white shadow rounded-lg p-8" {
            p class="text-xs font-semibold uppercase tracking-wide text-blue-600" { "FilmTrack" }
            h1 class="mt-2 text-3xl font-bold text-gray-900" { "A simple movie tracker" }
            p class="mt-2 text-gray-600" {
                "Track movies you love, add quick reviews, and easily mark movies as watched or in your backlog"
            }
            div class="mt-6 flex gap-3" {
                form method="post" action="/refresh" {
                    button class="rounded-md border border-gray-300 px-4 py-2 text-sm text-gray-700 hover:bg-gray-100" type="submit" disabled[state.loading] {
                        @if state.loading { "Refreshing…" } @else { "Refresh data" }
                    }
                }
                form method="post" action="/stats" {
                    button class="rounded-md bg-gray-900 px-4 py-2 text-sm text-white hover:bg-gray-700" type="submit" {
                        "📊 " @if state.show_stats { "Hide Stats" } @else { "Show Stats" }
                    }
                }
            }
        }
    }
}

fn stats_panel(state: &ClientState) -> Markup {
    let stats = state.stats();
    let average = format!("{:.1}", stats.average_rating.unwrap_or(0.0));

    html! {
        section class="grid gap-4 grid-cols-2 md:grid-cols-4" {
            (stat_card(&stats.total.to_string(), "Total Movies"))
            (stat_card(&stats.watched.to_string(), "Watched"))
            (stat_card(&stats.backlog.to_string(), "In Backlog"))
            (stat_card(&average, "Avg Rating"))
        }
    }
}

fn stat_card(value: &str, label: &str) -> Markup {
    html! {
        div class="bg-white shadow rounded-lg p-6 text-center" {
            div class="text-3xl font-bold text-gray-900" { (value) }
            div class="mt-1 text-sm text-gray-500" { (label) }
        }
    }
}

fn form_panel(state: &ClientState) -> Markup {
    let form = &state.form;
    let errors = &state.form_errors;
    let saving = state.is_saving(SavingKey::New);

    html! {
        section class="bg-white shadow rounded-lg p-8" {
            div class="flex items-start justify-between gap-4" {
                div {
                    p class="text-xs font-semibold uppercase tracking-wide text-gray-500" { "New entry" }
                    h2 class="text-xl font-semibold text-gray-900" { "Add a movie for review" }
                }
                @if let Some(error) = &state.error {
                    span class="text-sm text-red-600" { (error) }
                }
            }

            form class="mt-6 space-y-4" method="post" action="/movies" novalidate {
                div class="grid gap-4 md:grid-cols-2" {
                    label class="block text-sm font-medium text-gray-700" {
                        "Title"
                        input class=(INPUT_CLASS) type="text" name="title" value=(form.title) placeholder="Past Lives";
                        (field_error(errors.get("title")))
                    }
                    label class="block text-sm font-medium text-gray-700" {
                        "Director"
                        input class=(INPUT_CLASS) type="text" name="director" value=(form.director) placeholder="Celine Song";
                        (field_error(errors.get("director")))
                    }
                    label class="block text-sm font-medium text-gray-700" {
                        "Year"
                        input class=(INPUT_CLASS) type="number" name="year" value=(form.year) min=(EARLIEST_FILM_YEAR) placeholder="2023";
                        (field_error(errors.get("year")))
                    }
                    label class="block text-sm font-medium text-gray-700" {
                        "Rating (0-10)"
                        input class=(INPUT_CLASS) type="number" name="rating" value=(form.rating) min="0" max="10" step="0.5" placeholder="8.5";
                        (field_error(errors.get("rating")))
                    }
                }
                label class="block text-sm font-medium text-gray-700" {
                    "Quick review or note"
                    textarea class=(INPUT_CLASS) name="review" rows="3" placeholder="What should reviewers focus on?" { (form.review) }
                }
                button class="w-full rounded-md bg-blue-600 px-4 py-2 font-semibold text-white hover:bg-blue-700 disabled:opacity-50" type="submit" disabled[saving] {
                    @if saving { "Saving…" } @else { "Add to backlog" }
                }
            }
        }
    }
}

fn field_error(message: Option<&str>) -> Markup {
    html! {
        @if let Some(message) = message {
            small class="mt-1 block text-xs text-red-600" { (message) }
        }
    }
}

fn list_panel(state: &ClientState) -> Markup {
    let visible = state.visible();

    html! {
        section class="bg-white shadow rounded-lg p-8" {
            div class="flex items-start justify-between gap-4" {
                div {
                    p class="text-xs font-semibold uppercase tracking-wide text-gray-500" { "Backlog" }
                    h2 class="text-xl font-semibold text-gray-900" { "Movies to track" }
                }
                form class="flex gap-2" method="post" action="/filter" {
                    @for filter in Filter::ALL {
                        button class=(chip_class(filter == state.filter)) type="submit" name="filter" value=(filter.as_str()) {
                            (filter.as_str())
                        }
                    }
                }
            }

            @if state.loading {
                p class="mt-6 text-sm text-gray-500" { "Loading movies…" }
            } @else if visible.is_empty() {
                p class="mt-6 text-sm text-gray-500" { "No movies yet. Add one to get started." }
            }

            div class="mt-6 space-y-4" {
                @for movie in visible {
                    (movie_card(movie, state.is_saving(SavingKey::Movie(movie.id))))
                }
            }
        }
    }
}

fn chip_class(active: bool) -> &'static str {
    if active {
        "rounded-full bg-blue-600 px-3 py-1 text-sm text-white"
    } else {
        "rounded-full border border-gray-300 px-3 py-1 text-sm text-gray-700 hover:bg-gray-100"
    }
}

fn movie_card(movie: &Movie, saving: bool) -> Markup {
    let (badge, badge_class) = if movie.watched {
        ("Watched", "rounded-full bg-green-100 px-3 py-1 text-xs font-semibold text-green-800")
    } else {
        ("Backlog", "rounded-full bg-yellow-100 px-3 py-1 text-xs font-semibold text-yellow-800")
    };

    html! {
        article class="rounded-lg border border-gray-200 p-6" {
            div class="flex items-start justify-between gap-4" {
                div {
                    p class="text-xs text-gray-500" { (movie.year) }
                    h3 class="text-lg font-semibold text-gray-900" { (movie.title) }
                    p class="text-sm text-gray-600" { "Directed by " (movie.director) }
                }
                span class=(badge_class) { (badge) }
            }
            @if let Some(review) = &movie.review {
                p class="mt-4 italic text-gray-700" { "“" (review.trim()) "”" }
            }
            @if let Some(rating) = movie.rating {
                p class="mt-2 text-sm text-gray-700" { "⭐ Rating: " (rating) "/10" }
            }
            div class="mt-4 flex gap-2" {
                form method="post" action=(format!("/movies/{}/toggle", movie.id)) {
                    button class="rounded-md border border-gray-300 px-3 py-1 text-sm text-gray-700 hover:bg-gray-100 disabled:opacity-50" type="submit" disabled[saving] {
                        @if movie.watched { "Mark backlog" } @else { "Mark watched" }
                    }
                }
                form method="post" action=(format!("/movies/{}/delete", movie.id)) {
                    button class="rounded-md bg-red-600 px-3 py-1 text-sm text-white hover:bg-red-700 disabled:opacity-50" type="submit" disabled[saving] {
                        "Delete"
                    }
                }
            }
        }
    }
}
