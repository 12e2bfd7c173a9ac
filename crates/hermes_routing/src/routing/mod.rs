pub mod best_route;
pub mod dijkstra;
pub mod path_search;
pub mod route_point;
pub mod search_control;
