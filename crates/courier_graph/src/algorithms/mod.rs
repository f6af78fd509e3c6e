pub mod bellman_ford;
pub mod components;
pub mod cycle;
pub mod dijkstra;
pub mod floyd_warshall;
pub mod nearest_neighbor;
pub mod shortest_paths;
pub mod traversal;
