/// Отсутствующая ссылка в списке индексов.
const NIL: usize = usize::MAX;

/// Политика вытеснения: порядок, в котором слоты кэша покидают его.
///
/// Кэш хранит записи в арене и сообщает политике только индексы слотов.
/// Политика не владеет ни ключами, ни значениями.
pub trait EvictionPolicy {
    /// Регистрирует только что занятый слот.
    fn insert(
        &mut self,
        slot: usize,
    );

    /// Отмечает обращение к слоту (`get` или обновление через `put`).
    fn touch(
        &mut self,
        slot: usize,
    );

    /// Убирает слот из учёта.
    fn remove(
        &mut self,
        slot: usize,
    );

    /// Слот, который будет вытеснен следующим.
    fn victim(&self) -> Option<usize>;

    /// Слот, к которому обращались последним.
    fn most_recent(&self) -> Option<usize>;

    /// Следующий слот в порядке от свежих к старым.
    fn next_older(
        &self,
        slot: usize,
    ) -> Option<usize>;

    /// Сбрасывает политику в пустое состояние.
    fn clear(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Link {
    prev: usize,
    next: usize,
    linked: bool,
}

/// Least-recently-used: двусвязный список поверх индексов слотов.
///
/// В `head` самый свежий слот, в `tail` кандидат на вытеснение. Продвижение
/// и удаление переписывают только пару индексов, без указателей.
#[derive(Debug, Clone)]
pub struct LruPolicy {
    links: Vec<Link>,
    head: usize,
    tail: usize,
    len: usize,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl Link {
    const DETACHED: Link = Link {
        prev: NIL,
        next: NIL,
        linked: false,
    };
}

impl LruPolicy {
    pub fn new() -> Self {
        Self {
            links: Vec::new(),
            head: NIL,
            tail: NIL,
            len: 0,
        }
    }

    /// Количество слотов в списке.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn is_linked(
        &self,
        slot: usize,
    ) -> bool {
        self.links.get(slot).is_some_and(|l| l.linked)
    }

    fn push_front(
        &mut self,
        slot: usize,
    ) {
        if slot >= self.links.len() {
            self.links.resize(slot + 1, Link::DETACHED);
        }

        self.links[slot] = Link {
            prev: NIL,
            next: self.head,
            linked: true,
        };

        if self.head != NIL {
            self.links[self.head].prev = slot;
        } else {
            self.tail = slot;
        }

        self.head = slot;
        self.len += 1;
    }

    fn detach(
        &mut self,
        slot: usize,
    ) {
        let Link { prev, next, .. } = self.links[slot];

        if prev != NIL {
            self.links[prev].next = next;
        } else {
            self.head = next;
        }

        if next != NIL {
            self.links[next].prev = prev;
        } else {
            self.tail = prev;
        }

        self.links[slot] = Link::DETACHED;
        self.len -= 1;
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для LruPolicy
////////////////////////////////////////////////////////////////////////////////

impl EvictionPolicy for LruPolicy {
    fn insert(
        &mut self,
        slot: usize,
    ) {
        if self.is_linked(slot) {
            self.detach(slot);
        }
        self.push_front(slot);
    }

    fn touch(
        &mut self,
        slot: usize,
    ) {
        if self.head == slot || !self.is_linked(slot) {
            return;
        }
        self.detach(slot);
        self.push_front(slot);
    }

    fn remove(
        &mut self,
        slot: usize,
    ) {
        if self.is_linked(slot) {
            self.detach(slot);
        }
    }

    fn victim(&self) -> Option<usize> {
        (self.tail != NIL).then_some(self.tail)
    }

    fn most_recent(&self) -> Option<usize> {
        (self.head != NIL).then_some(self.head)
    }

    fn next_older(
        &self,
        slot: usize,
    ) -> Option<usize> {
        self.links
            .get(slot)
            .filter(|l| l.linked && l.next != NIL)
            .map(|l| l.next)
    }

    fn clear(&mut self) {
        self.links.clear();
        self.head = NIL;
        self.tail = NIL;
        self.len = 0;
    }
}

impl Default for LruPolicy {
    fn default() -> Self {
        Self::new()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
