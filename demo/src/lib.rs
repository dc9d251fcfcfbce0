use leptos::*;
use leptos_graphql::*;
use serde::Deserialize;

pub mod gqlgen;

use gqlgen::{CountryQuery, CountryQueryCountry, CountryQueryVariables, COUNTRY_QUERY_DOCUMENT};

const ENDPOINT: &str = "https://countries.trevorblades.com/";

#[component]
pub fn App() -> impl IntoView {
    let client = create_graphql_client(
        ENDPOINT,
        ClientOptions::default().set_credentials(Credentials::SameOrigin),
    );

    match client {
        Ok(client) => {
            provide_graphql_client(client);
            view! { <Countries/> }.into_view()
        }
        Err(error) => view! { <p>{error.to_string()}</p> }.into_view(),
    }
}

// Typed by hand since plain strings carry no type information.
#[derive(Debug, Clone, Deserialize)]
struct CountriesQuery {
    countries: Vec<CountryItem>,
}

#[derive(Debug, Clone, Deserialize)]
struct CountryItem {
    name: String,
    code: String,
}

#[component]
fn Countries() -> impl IntoView {
    let (code, set_code) = create_signal("BR".to_string());
    let client = use_graphql_client();

    // A plain string query.
    let QueryResult {
        data: countries,
        error: countries_error,
        ..
    } = client.use_query::<CountriesQuery>(gql(
        "query CountriesQuery {
          countries {
            name
            code
          }
        }",
    ));

    // A generated document: result and variables types are inferred.
    let QueryResult { data: country, .. } = client.use_query_with_options(
        COUNTRY_QUERY_DOCUMENT,
        move || CountryQueryVariables { code: code.get() },
        QueryOptions::default().set_default_value(Some(CountryQuery {
            country: Some(CountryQueryCountry {
                name: "loading...".to_string(),
            }),
        })),
    );

    let country_name = move || {
        country
            .get()
            .and_then(|data| data.country)
            .map(|country| country.name)
    };

    view! {
        <div class="p-24 box-border w-full min-h-screen flex flex-col justify-center items-center space-y-4 bg-gray-800 text-white">
            <h3>"Get country by code"</h3>
            <input
                prop:value=code
                on:input=move |ev| set_code.set(event_target_value(&ev).to_uppercase())
            />
            <h4>
                <Show when=move || country_name().is_some() fallback=|| "not found">
                    <p>{country_name}</p>
                </Show>
            </h4>
            <h3>"Countries:"</h3>
            <Show when=move || countries.with(Option::is_some)>
                <ul>
                    <For
                        each=move || countries.get().map(|d| d.countries).unwrap_or_default()
                        key=|country: &CountryItem| country.code.clone()
                        children=|country: CountryItem| {
                            view! { <li>{country.code} " - " {country.name}</li> }
                        }
                    />
                </ul>
            </Show>
            {move || countries_error.get().map(|error| view! { <p class="text-red-400">{error.to_string()}</p> })}
        </div>
    }
}
