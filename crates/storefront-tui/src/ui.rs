// UI rendering logic
use crate::{App, InputMode};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};
use storefront_core::views::{self, FavoritesView, ProductDetailView, ProductListView};
use storefront_core::{Product, Route};

pub fn render(frame: &mut Frame, app: &mut App) {
    let show_search = app.route == Route::Products;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(if show_search {
            vec![
                Constraint::Length(3), // Header
                Constraint::Length(3), // Search input
                Constraint::Min(5),    // Main content
                Constraint::Length(1), // Status bar
            ]
        } else {
            vec![
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(1),
            ]
        })
        .split(frame.area());

    render_header(frame, app, chunks[0]);

    let (content_area, status_area) = if show_search {
        render_search_input(frame, app, chunks[1]);
        (chunks[2], chunks[3])
    } else {
        (chunks[1], chunks[2])
    };

    match app.route.clone() {
        Route::Products => render_product_list(frame, app, content_area),
        Route::ProductDetails(_) => render_product_detail(frame, app, content_area),
        Route::Favorites => render_favorites(frame, app, content_area),
        Route::NotFound(path) => render_message(
            frame,
            content_area,
            "Not Found",
            &format!("Nothing lives at {}", path),
            None,
            Color::Red,
        ),
    }

    render_status_bar(frame, app, status_area);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let tab_style = |active: bool| {
        if active {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        }
    };

    let on_favorites = app.route == Route::Favorites;
    let spans = vec![
        Span::styled(
            "Storefront",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(" Products ", tab_style(!on_favorites)),
        Span::raw(" "),
        Span::styled(
            format!(" Favorites ({}) ", app.favorites.len()),
            tab_style(on_favorites),
        ),
    ];

    let header = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title(app.route.title()));
    frame.render_widget(header, area);
}

fn render_search_input(frame: &mut Frame, app: &App, area: Rect) {
    let input_style = match app.input_mode {
        InputMode::Searching => Style::default().fg(Color::Yellow),
        InputMode::Normal => Style::default(),
    };

    let category = app.category.map(|c| c.label()).unwrap_or("All Categories");
    let title = format!(
        "Search products... | {} | {}",
        category,
        app.sort.label()
    );

    let input = Paragraph::new(app.search_input.as_str())
        .style(input_style)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(input_style),
        );

    frame.render_widget(input, area);

    if app.input_mode == InputMode::Searching {
        frame.set_cursor_position((
            area.x + app.search_input.chars().count() as u16 + 1,
            area.y + 1,
        ));
    }
}

fn product_item<'a>(product: &'a Product, is_favorite: bool, selected: bool) -> ListItem<'a> {
    let name_style = if selected {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    };

    let line1 = Line::from(vec![
        Span::styled(
            if is_favorite { "♥ " } else { "  " },
            Style::default().fg(Color::Red),
        ),
        Span::styled(product.title.as_str(), name_style),
    ]);

    let line2 = Line::from(vec![
        Span::raw("  "),
        Span::styled(
            product.price.to_string(),
            Style::default().fg(Color::Rgb(255, 215, 0)),
        ),
        Span::raw("  •  "),
        Span::styled(
            product.category.as_deref().unwrap_or("uncategorized"),
            Style::default().fg(Color::Rgb(128, 128, 128)),
        ),
    ]);

    ListItem::new(vec![line1, line2])
}

fn render_product_list(frame: &mut Frame, app: &mut App, area: Rect) {
    let state = app.products_state();
    let query = app.query();
    let view = views::product_list(&state, &query, &app.favorites);

    match view {
        ProductListView::Loading => render_loading(frame, area, " Products (Loading...) "),
        ProductListView::Failed { title, message } => render_message(
            frame,
            area,
            title,
            &message,
            Some("Press r to try again"),
            Color::Red,
        ),
        ProductListView::Empty { message } => {
            render_message(frame, area, "Products (0)", message, None, Color::DarkGray)
        }
        ProductListView::Products(rows) => {
            let items: Vec<ListItem> = rows
                .iter()
                .enumerate()
                .map(|(i, row)| product_item(row.product, row.is_favorite, i == app.selected_index))
                .collect();

            let list = List::new(items)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(format!("Products ({})", rows.len())),
                )
                .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
                .highlight_symbol(">> ");

            frame.render_stateful_widget(list, area, &mut app.list_state);
        }
    }
}

fn render_product_detail(frame: &mut Frame, app: &App, area: Rect) {
    let state = app.detail_state();

    match views::product_detail(state.as_ref(), &app.favorites) {
        ProductDetailView::Loading => render_loading(frame, area, " Product Details (Loading...) "),
        ProductDetailView::Failed { title, message } => render_message(
            frame,
            area,
            title,
            &message,
            Some("Press r to try again, Esc to go back"),
            Color::Red,
        ),
        ProductDetailView::NotFound { message } => render_message(
            frame,
            area,
            message,
            "",
            Some("Press Esc to go back"),
            Color::Yellow,
        ),
        ProductDetailView::Loaded {
            product,
            is_favorite,
            stars,
        } => {
            let mut lines = vec![
                Line::from(Span::styled(
                    product.title.as_str(),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(vec![
                    Span::styled("Price:     ", Style::default().fg(Color::Gray)),
                    Span::styled(
                        product.price.to_string(),
                        Style::default().fg(Color::Rgb(255, 215, 0)),
                    ),
                ]),
                Line::from(vec![
                    Span::styled("Category:  ", Style::default().fg(Color::Gray)),
                    Span::raw(product.category.as_deref().unwrap_or("uncategorized")),
                ]),
            ];

            if let (Some(stars), Some(rating)) = (stars, product.rating) {
                lines.push(Line::from(vec![
                    Span::styled("Rating:    ", Style::default().fg(Color::Gray)),
                    Span::styled(stars.render(), Style::default().fg(Color::Rgb(255, 215, 0))),
                    Span::styled(
                        format!(" ({} reviews)", rating.count),
                        Style::default().fg(Color::DarkGray),
                    ),
                ]));
            }

            lines.push(Line::from(""));
            lines.push(Line::from(Span::raw(
                product.description.as_deref().unwrap_or("No description"),
            )));
            lines.push(Line::from(""));
            lines.push(if is_favorite {
                Line::from(Span::styled(
                    "♥ Remove from Favorites (f)",
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                ))
            } else {
                Line::from(Span::styled(
                    "♡ Add to Favorites (f)",
                    Style::default().fg(Color::Green),
                ))
            });

            let paragraph = Paragraph::new(lines)
                .block(Block::default().borders(Borders::ALL).title("Product Details"))
                .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, area);
        }
    }
}

fn render_favorites(frame: &mut Frame, app: &mut App, area: Rect) {
    match views::favorites_page(&app.favorites) {
        FavoritesView::Empty { title, hint } => {
            render_message(frame, area, title, hint, None, Color::DarkGray)
        }
        FavoritesView::Products(products) => {
            let items: Vec<ListItem> = products
                .iter()
                .enumerate()
                .map(|(i, product)| product_item(product, true, i == app.selected_index))
                .collect();

            let list = List::new(items)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(format!("Favorites ({})", products.len())),
                )
                .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
                .highlight_symbol(">> ");

            frame.render_stateful_widget(list, area, &mut app.list_state);
        }
    }
}

fn render_loading(frame: &mut Frame, area: Rect, title: &str) {
    let loading_text = vec![
        Line::from(""),
        Line::from(""),
        Line::from(Span::styled(
            "Loading...",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
    ];

    let paragraph = Paragraph::new(loading_text)
        .block(Block::default().borders(Borders::ALL).title(title))
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

fn render_message(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    message: &str,
    hint: Option<&str>,
    color: Color,
) {
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            title.to_string(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(message.to_string()),
    ];
    if let Some(hint) = hint {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            hint.to_string(),
            Style::default().fg(Color::DarkGray),
        )));
    }

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let status = if let Some(message) = &app.status_message {
        Span::styled(message.as_str(), Style::default().fg(Color::Green))
    } else {
        match (app.input_mode, &app.route) {
            (InputMode::Searching, _) => Span::styled(
                search_mode_hint(app),
                Style::default().fg(Color::Yellow),
            ),
            (InputMode::Normal, Route::Products) => Span::raw(
                "j/k: navigate | /: search | x: clear | c: category | s: sort | f: favorite | TAB: favorites | ENTER: details | r: reload | q: quit",
            ),
            (InputMode::Normal, Route::ProductDetails(_)) => {
                Span::raw("f: favorite | r: reload | ESC: back | q: quit")
            }
            (InputMode::Normal, Route::Favorites) => {
                Span::raw("j/k: navigate | f: remove | ENTER: details | TAB/ESC: back | q: quit")
            }
            (InputMode::Normal, Route::NotFound(_)) => Span::raw("ESC: back | q: quit"),
        }
    };

    frame.render_widget(Paragraph::new(Line::from(status)), area);
}

/// Status line while typing; says how long the list waits before filtering
fn search_mode_hint(app: &App) -> String {
    let pending = if app.search.is_pending() { " (filtering...)" } else { "" };
    format!(
        "SEARCH MODE{} | filters after {}ms pause | ESC: normal mode | ENTER: apply now",
        pending,
        app.search.delay().as_millis()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use storefront_core::{FavoritesStore, ProductId, ProductQueries, ProductSource, Result};

    struct EmptySource;

    #[async_trait::async_trait]
    impl ProductSource for EmptySource {
        async fn fetch_products(&self) -> Result<Vec<Product>> {
            Ok(Vec::new())
        }

        async fn fetch_product(&self, _id: ProductId) -> Result<Option<Product>> {
            Ok(None)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_hint_shows_configured_delay() {
        let queries = Arc::new(ProductQueries::new(Arc::new(EmptySource)));
        let mut app = App::new(queries, FavoritesStore::new(), Duration::from_millis(250));

        assert!(search_mode_hint(&app).contains("filters after 250ms pause"));
        assert!(!search_mode_hint(&app).contains("filtering..."));

        app.push_search_char('x');
        assert!(search_mode_hint(&app).contains("(filtering...)"));
    }
}
