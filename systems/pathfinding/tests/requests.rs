use fogline_core::{EntityId, GridCoordinate, GridError, MapConfig, Traversal};
use fogline_system_pathfinding::{PathRequest, PathRequestQueue, PathResponse, Pathfinder};
use fogline_world::GridIndex;

fn grid(columns: u32, rows: u32) -> GridIndex {
    GridIndex::generate(&MapConfig::new(columns, rows)).expect("valid grid")
}

#[test]
fn budget_limits_searches_per_pass() {
    let grid = grid(6, 6);
    let mut pathfinder = Pathfinder::new();
    let mut queue = PathRequestQueue::new();
    for id in 0..5 {
        queue.request(
            EntityId::new(id),
            GridCoordinate::new(0, 0),
            GridCoordinate::new(5, id as i32),
        );
    }

    let mut responses = Vec::new();
    assert_eq!(queue.process(&mut pathfinder, &grid, 2, &mut responses), 2);
    assert_eq!(responses.len(), 2);
    assert_eq!(queue.len(), 3);

    assert_eq!(queue.process(&mut pathfinder, &grid, 10, &mut responses), 3);
    assert!(queue.is_empty());

    let answered: Vec<_> = responses
        .iter()
        .map(|response| match response {
            PathResponse::Found { requester, path } => {
                assert!(!path.is_empty());
                requester.get()
            }
            PathResponse::Rejected { .. } => panic!("unexpected rejection"),
        })
        .collect();
    assert_eq!(answered, vec![0, 1, 2, 3, 4]);
}

#[test]
fn unreachable_requests_wait_for_the_goal_to_clear() {
    let mut grid = grid(3, 1);
    let goal = GridCoordinate::new(2, 0);
    let blocker = EntityId::new(99);
    let _ = grid.set_unit_occupancy(goal, Some(blocker)).expect("in bounds");

    let mut pathfinder = Pathfinder::new();
    let mut queue = PathRequestQueue::new();
    let requester = EntityId::new(1);
    queue.request(requester, GridCoordinate::new(0, 0), goal);

    let mut responses = Vec::new();
    assert_eq!(queue.process(&mut pathfinder, &grid, 4, &mut responses), 1);
    assert!(responses.is_empty());
    assert!(queue.contains(requester));

    let _ = grid.set_unit_occupancy(goal, None).expect("in bounds");
    assert_eq!(queue.process(&mut pathfinder, &grid, 4, &mut responses), 1);

    assert!(queue.is_empty());
    assert!(matches!(
        responses.as_slice(),
        [PathResponse::Found { requester: found, path }] if *found == requester && path.len() == 3
    ));
}

#[test]
fn out_of_bounds_requests_are_rejected_and_dropped() {
    let grid = grid(3, 3);
    let mut pathfinder = Pathfinder::new();
    let mut queue = PathRequestQueue::new();
    let goal = GridCoordinate::new(7, 7);
    queue.request_with(PathRequest {
        requester: EntityId::new(5),
        start: GridCoordinate::new(0, 0),
        goal,
        traversal: Traversal::Pathable,
    });

    let mut responses = Vec::new();
    let _ = queue.process(&mut pathfinder, &grid, 1, &mut responses);

    assert!(queue.is_empty());
    assert_eq!(
        responses,
        vec![PathResponse::Rejected {
            requester: EntityId::new(5),
            reason: GridError::OutOfBounds { cell: goal },
        }]
    );
}

#[test]
fn zero_budget_leaves_queue_untouched() {
    let grid = grid(2, 2);
    let mut pathfinder = Pathfinder::new();
    let mut queue = PathRequestQueue::new();
    queue.request(
        EntityId::new(1),
        GridCoordinate::new(0, 0),
        GridCoordinate::new(1, 1),
    );

    let mut responses = Vec::new();
    assert_eq!(queue.process(&mut pathfinder, &grid, 0, &mut responses), 0);
    assert_eq!(queue.len(), 1);
    assert!(responses.is_empty());
}
